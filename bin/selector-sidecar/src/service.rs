use crate::{config::Cli, decode::PlaceholderDecoder};
use bundle_forwarder::{BundleForwarder, ForwardJob};
use bundle_pool::BundlePool;
use jsonrpsee::server::{ServerBuilder, ServerHandle};
use rejected_tx_reporter::RejectedTxReporter;
use selector_core::config::{load_module_limits, DenyList};
use selector_rpc::{BundleRpcServer, LineaBundleApiServer, PluginConfigReloader, PluginsApiServer, PluginsRpcServer};
use std::{
    future::Future,
    net::SocketAddr,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tokio::task::{JoinError, JoinHandle};
use tracing::info;

/// Bytes held across all bundles in the pool before oldest-admitted entries
/// are evicted. Not yet exposed on the CLI surface named in spec.md §6.
const BUNDLE_POOL_CAPACITY_BYTES: usize = 64 * 1024 * 1024;

pub struct Service {
    cli: Cli,
}

struct DenyListReloader {
    deny_list: Arc<parking_lot::RwLock<DenyList>>,
}

#[async_trait::async_trait]
impl PluginConfigReloader for DenyListReloader {
    async fn reload(&self) -> Result<(), selector_core::ConfigError> {
        self.deny_list.write().reload()
    }
}

impl Service {
    pub fn from(cli: Cli) -> Self {
        Self { cli }
    }

    pub async fn spawn(self) -> eyre::Result<ServiceHandle> {
        let Cli {
            rpc_host,
            rpc_port,
            data_dir,
            module_limit_file_path,
            deny_list_path,
            tx_pool_simulation_check_api_enabled,
            bundles_forward_urls,
            rejected_tx_endpoint,
            blob_tx_enabled,
        } = self.cli;

        // Fatal at startup per spec.md §7: a malformed module-limits file or
        // deny-list must not result in a silently misconfigured sidecar.
        let limits = load_module_limits(module_limit_file_path.display().to_string())?;
        info!(modules = ?limits, "loaded module line-count limits");
        let deny_list = Arc::new(parking_lot::RwLock::new(DenyList::load(&deny_list_path)?));
        info!(path = %deny_list_path.display(), "loaded deny-list");
        info!(tx_pool_simulation_check_api_enabled, blob_tx_enabled, "sidecar feature flags");

        let pool = Arc::new(BundlePool::new(BUNDLE_POOL_CAPACITY_BYTES));

        let report_dir = data_dir.join("rej_tx_rpc");
        tokio::fs::create_dir_all(&report_dir).await?;
        let reporter = Arc::new(RejectedTxReporter::new(report_dir, rejected_tx_endpoint));
        reporter.recover().await?;

        let forwarder = Arc::new(BundleForwarder::new(bundles_forward_urls));

        let mut admissions = pool.subscribe();
        let forward_bridge = {
            let forwarder = forwarder.clone();
            tokio::spawn(async move {
                while let Some(bundle) = admissions.recv().await {
                    let payload = serde_json::json!({
                        "jsonrpc": "2.0",
                        "method": "linea_sendBundle",
                        "params": [{
                            "blockNumber": bundle.block_number,
                            "bundleHash": bundle.bundle_id,
                        }],
                        "id": 0,
                    });
                    forwarder.forward(ForwardJob {
                        block_number: bundle.block_number,
                        bundle_id: bundle.bundle_id,
                        payload,
                    });
                }
            })
        };

        let mut rpc_module = jsonrpsee::RpcModule::new(());
        let bundle_server = BundleRpcServer::new(pool.clone(), PlaceholderDecoder);
        rpc_module.merge(bundle_server.into_rpc())?;
        let plugins_server = PluginsRpcServer::new(Arc::new(DenyListReloader { deny_list: deny_list.clone() }));
        rpc_module.merge(plugins_server.into_rpc())?;

        let addr = SocketAddr::from((rpc_host, rpc_port));
        let server = ServerBuilder::default().build(addr).await?;
        let server_addr = server.local_addr()?;
        let server_handle = server.start(rpc_module);
        info!(addr = %server_addr, "selector-rpc server listening");

        let rpc_server = tokio::spawn(wait_for_stop(server_handle));

        Ok(ServiceHandle { rpc_server, forward_bridge })
    }
}

async fn wait_for_stop(handle: ServerHandle) {
    handle.stopped().await
}

/// Holds the handles to the spawned RPC server and admission-forwarding
/// bridge tasks; resolves when either exits (normally only on shutdown or a
/// bug), mirroring `mev_build_rs::service::ServiceHandle`.
#[pin_project::pin_project]
pub struct ServiceHandle {
    #[pin]
    rpc_server: JoinHandle<()>,
    #[pin]
    forward_bridge: JoinHandle<()>,
}

impl Future for ServiceHandle {
    type Output = Result<(), JoinError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let rpc_server = this.rpc_server.poll(cx);
        if rpc_server.is_ready() {
            return rpc_server
        }
        this.forward_bridge.poll(cx)
    }
}
