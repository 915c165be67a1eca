use crate::{
    decode::TransactionDecoder,
    params::{CancelBundleParams, SendBundleParams},
    reload::PluginConfigReloader,
    result::{internal_rpc_err, invalid_params},
};
use alloy_primitives::B256;
use bundle_pool::BundlePool;
use jsonrpsee::{core::RpcResult, proc_macros::rpc};
use selector_core::{Bundle, Error as CoreError, PendingTransaction};
use std::sync::{atomic::{AtomicU64, Ordering}, Arc};
use tracing::{info, warn};

#[rpc(server, namespace = "linea")]
pub trait LineaBundleApi {
    #[method(name = "sendBundle")]
    async fn send_bundle(&self, params: SendBundleParams) -> RpcResult<B256>;

    #[method(name = "cancelBundle")]
    async fn cancel_bundle(&self, params: CancelBundleParams) -> RpcResult<bool>;
}

#[rpc(server, namespace = "plugins")]
pub trait PluginsApi {
    #[method(name = "reloadPluginConfig")]
    async fn reload_plugin_config(&self, plugin_name: String) -> RpcResult<String>;
}

/// Implements `linea_sendBundle` / `linea_cancelBundle` by admitting parsed
/// bundles directly into the shared [`BundlePool`] (spec.md §6).
pub struct BundleRpcServer<D> {
    pool: Arc<BundlePool>,
    decoder: D,
    sequence: AtomicU64,
}

impl<D: TransactionDecoder> BundleRpcServer<D> {
    pub fn new(pool: Arc<BundlePool>, decoder: D) -> Self {
        Self { pool, decoder, sequence: AtomicU64::new(0) }
    }

    fn build_bundle(&self, params: SendBundleParams) -> Result<Bundle, jsonrpsee::types::ErrorObjectOwned> {
        if params.txs.is_empty() {
            return Err(invalid_params(CoreError::EmptyBundle.to_string()))
        }
        if let Some(max_timestamp) = params.max_timestamp {
            let now = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs();
            if now > max_timestamp {
                return Err(invalid_params(CoreError::BundleExpired.to_string()))
            }
        }
        let mut pending_txs = Vec::with_capacity(params.txs.len());
        for (idx, raw) in params.txs.iter().enumerate() {
            let bytes = raw
                .strip_prefix("0x")
                .and_then(|hex_str| hex::decode(hex_str).ok())
                .ok_or_else(|| invalid_params(CoreError::MalformedBundleParam.to_string()))?;
            let tx = self.decoder.decode(&bytes).map_err(|err| {
                invalid_params(
                    CoreError::InvalidTransaction { idx, hash: raw.clone(), reason: err.0 }.to_string(),
                )
            })?;
            pending_txs.push(PendingTransaction::new(tx));
        }
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        Bundle::new(
            params.block_number,
            pending_txs,
            params.min_timestamp,
            params.max_timestamp,
            params.reverting_tx_hashes,
            params.replacement_uuid,
            sequence,
        )
        .map_err(|err| invalid_params(err.to_string()))
    }
}

#[async_trait::async_trait]
impl<D: TransactionDecoder + 'static> LineaBundleApiServer for BundleRpcServer<D> {
    async fn send_bundle(&self, params: SendBundleParams) -> RpcResult<B256> {
        let bundle = self.build_bundle(params)?;
        let bundle_id = bundle.bundle_id;
        let outcome = self.pool.put_or_replace(bundle);
        info!(%bundle_id, ?outcome, "bundle admitted via linea_sendBundle");
        Ok(bundle_id)
    }

    async fn cancel_bundle(&self, params: CancelBundleParams) -> RpcResult<bool> {
        let Some(bundle) = self.pool.get_by_uuid(&params.replacement_uuid) else { return Ok(false) };
        Ok(self.pool.remove(&bundle.bundle_id))
    }
}

/// Implements `plugins_reloadPluginConfig` by delegating to whatever the
/// composition root wired up as the live pipeline's reload hook.
pub struct PluginsRpcServer {
    reloader: Arc<dyn PluginConfigReloader>,
}

impl PluginsRpcServer {
    pub fn new(reloader: Arc<dyn PluginConfigReloader>) -> Self {
        Self { reloader }
    }
}

#[async_trait::async_trait]
impl PluginsApiServer for PluginsRpcServer {
    async fn reload_plugin_config(&self, plugin_name: String) -> RpcResult<String> {
        self.reloader.reload().await.map_err(|err| {
            warn!(%err, plugin_name, "plugin config reload failed");
            internal_rpc_err(err.to_string())
        })?;
        Ok("Success".to_string())
    }
}
