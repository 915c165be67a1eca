mod decode;
mod params;
mod reload;
mod result;
mod server;

pub use decode::{DecodeError, TransactionDecoder};
pub use params::{CancelBundleParams, SendBundleParams};
pub use reload::PluginConfigReloader;
pub use server::{
    BundleRpcServer, LineaBundleApiServer, PluginsApi, PluginsApiServer, PluginsRpcServer,
};

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, Bytes, U256};
    use bundle_pool::BundlePool;
    use selector_core::{Transaction, TransactionType};
    use std::sync::Arc;

    struct StubDecoder;

    impl TransactionDecoder for StubDecoder {
        fn decode(&self, rlp: &[u8]) -> Result<Transaction, DecodeError> {
            if rlp.is_empty() {
                return Err(DecodeError("empty payload".to_string()))
            }
            Ok(Transaction {
                hash: alloy_primitives::keccak256(rlp),
                sender: Address::ZERO,
                recipient: Some(Address::ZERO),
                payload: Bytes::copy_from_slice(rlp),
                gas_limit: 21_000,
                max_fee_per_gas: U256::from(1u64),
                max_priority_fee_per_gas: U256::from(1u64),
                tx_type: TransactionType::FeeMarket,
            })
        }
    }

    #[tokio::test]
    async fn send_bundle_admits_a_well_formed_bundle() {
        let pool = Arc::new(BundlePool::new(1_000_000));
        let server = BundleRpcServer::new(pool.clone(), StubDecoder);
        let params = SendBundleParams {
            txs: vec!["0xdeadbeef".to_string()],
            block_number: 10,
            min_timestamp: None,
            max_timestamp: None,
            reverting_tx_hashes: None,
            replacement_uuid: None,
        };
        let bundle_id = server.send_bundle(params).await.unwrap();
        assert!(pool.get_by_id(&bundle_id).is_some());
    }

    #[tokio::test]
    async fn send_bundle_rejects_an_empty_tx_list() {
        let pool = Arc::new(BundlePool::new(1_000_000));
        let server = BundleRpcServer::new(pool, StubDecoder);
        let params = SendBundleParams {
            txs: Vec::new(),
            block_number: 10,
            min_timestamp: None,
            max_timestamp: None,
            reverting_tx_hashes: None,
            replacement_uuid: None,
        };
        assert!(server.send_bundle(params).await.is_err());
    }

    #[tokio::test]
    async fn cancel_bundle_removes_by_replacement_uuid() {
        let pool = Arc::new(BundlePool::new(1_000_000));
        let server = BundleRpcServer::new(pool.clone(), StubDecoder);
        let uuid = uuid::Uuid::new_v4();
        let params = SendBundleParams {
            txs: vec!["0xaa".to_string()],
            block_number: 10,
            min_timestamp: None,
            max_timestamp: None,
            reverting_tx_hashes: None,
            replacement_uuid: Some(uuid),
        };
        server.send_bundle(params).await.unwrap();
        let cancel = CancelBundleParams { replacement_uuid: uuid };
        assert!(server.cancel_bundle(cancel).await.unwrap());
        assert!(!server.cancel_bundle(cancel).await.unwrap());
    }

    struct AlwaysReloads;

    #[async_trait::async_trait]
    impl PluginConfigReloader for AlwaysReloads {
        async fn reload(&self) -> Result<(), selector_core::ConfigError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn reload_plugin_config_returns_success_string() {
        let server = PluginsRpcServer::new(Arc::new(AlwaysReloads));
        assert_eq!(server.reload_plugin_config("deny-list".to_string()).await.unwrap(), "Success");
    }
}
