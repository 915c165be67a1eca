pub mod config;
pub mod host;
pub mod pipeline;

pub use config::SelectorConfig;
pub use host::{HostExecutor, Snapshot, TransactionProcessingResult};
pub use pipeline::{Decision, PendingBlockHeader, SelectorFactory, SelectorPipeline};

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, Bytes, B256, U256};
    use bundle_pool::BundlePool;
    use parking_lot::Mutex;
    use selector_core::{
        config::DenyList, Bundle, ModuleLimits, PendingTransaction, PricingSource,
        ProfitabilityInputs, Transaction, TransactionSelectionResult, TransactionType,
    };
    use std::{collections::HashMap, sync::Arc};

    struct MockHost {
        module: &'static str,
        per_tx_delta: u64,
        fail: Mutex<bool>,
        executed: Mutex<Vec<B256>>,
    }

    impl MockHost {
        fn new(module: &'static str, per_tx_delta: u64) -> Self {
            Self { module, per_tx_delta, fail: Mutex::new(false), executed: Mutex::new(Vec::new()) }
        }
    }

    impl HostExecutor for MockHost {
        fn execute(&self, tx: &PendingTransaction) -> TransactionProcessingResult {
            self.executed.lock().push(tx.hash());
            let count = self.executed.lock().len() as u64 * self.per_tx_delta;
            TransactionProcessingResult {
                failed: *self.fail.lock(),
                gas_used: tx.transaction.gas_limit,
                cumulative_module_counts: HashMap::from([(self.module.to_string(), count)]),
                invoked_precompiles: Vec::new(),
                compressed_size: tx.transaction.payload.len() as u64,
            }
        }

        fn snapshot(&self) -> Snapshot {
            Snapshot(self.executed.lock().len() as u64)
        }

        fn rollback(&self, snapshot: Snapshot) {
            self.executed.lock().truncate(snapshot.0 as usize);
        }
    }

    fn tx(hash_byte: u8, sender: Address) -> PendingTransaction {
        let mut hash = [0u8; 32];
        hash[31] = hash_byte;
        PendingTransaction::new(Transaction {
            hash: hash.into(),
            sender,
            recipient: Some(Address::ZERO),
            payload: Bytes::from(vec![1u8; 10]),
            gas_limit: 21_000,
            max_fee_per_gas: U256::from(10_000_000_000u64),
            max_priority_fee_per_gas: U256::from(9_000_000_000u64),
            tx_type: TransactionType::FeeMarket,
        })
    }

    fn pipeline(module: &'static str, limit: u64) -> (SelectorPipeline<MockHost>, Arc<BundlePool>) {
        let limits = ModuleLimits::new(HashMap::from([(module.to_string(), limit)]));
        let config = SelectorConfig::default();
        let pricing = Arc::new(PricingSource::new(ProfitabilityInputs {
            fixed_cost_wei: U256::ZERO,
            variable_cost_wei: U256::ZERO,
            min_margin_ratio: U256::from(1u64),
            extra_data_pricing_enabled: false,
        }));
        let pool = Arc::new(BundlePool::new(1_000_000));
        let factory = SelectorFactory::new(limits, config);
        let host = Arc::new(MockHost::new(module, 1));
        let pipeline = factory.build(pricing, pool.clone(), DenyList::empty(), host);
        (pipeline, pool)
    }

    fn header(number: u64) -> PendingBlockHeader {
        PendingBlockHeader { number, timestamp: 1_000, base_fee: U256::from(1_000_000_000u64) }
    }

    #[test]
    fn profitable_transaction_is_selected() {
        let (mut pipeline, _pool) = pipeline("PRECOMPILE_X", 100);
        let decisions =
            pipeline.select_block(header(1), vec![tx(1, Address::with_last_byte(1))]);
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].result, TransactionSelectionResult::Selected);
    }

    #[test]
    fn denylisted_sender_is_rejected_without_execution() {
        let sender = Address::with_last_byte(7);
        let limits = ModuleLimits::new(HashMap::from([("PRECOMPILE_X".to_string(), 100)]));
        let config = SelectorConfig::default();
        let pricing = Arc::new(PricingSource::default());
        let pool = Arc::new(BundlePool::new(1_000_000));
        let mut deny = DenyList::empty();
        deny.insert_for_test(sender);
        let host = Arc::new(MockHost::new("PRECOMPILE_X", 1));
        let factory = SelectorFactory::new(limits, config);
        let mut pipeline = factory.build(pricing, pool, deny, host);

        let decisions = pipeline.select_block(header(1), vec![tx(1, sender)]);
        assert!(matches!(decisions[0].result, TransactionSelectionResult::Invalid(_)));
    }

    #[test]
    fn per_tx_module_overflow_is_a_permanent_rejection() {
        let (mut pipeline, _pool) = pipeline("PRECOMPILE_MODEXP_EFFECTIVE_CALLS", 10_000);
        // force a single-tx delta far above the limit via a dedicated host
        let limits =
            ModuleLimits::new(HashMap::from([("PRECOMPILE_MODEXP_EFFECTIVE_CALLS".to_string(), 10_000)]));
        let config = SelectorConfig::default();
        let pricing = Arc::new(PricingSource::default());
        let pool = Arc::new(BundlePool::new(1_000_000));
        let host = Arc::new(MockHost::new("PRECOMPILE_MODEXP_EFFECTIVE_CALLS", 2_147_483_647));
        let factory = SelectorFactory::new(limits, config);
        let mut pipeline = factory.build(pricing, pool, DenyList::empty(), host);

        let decisions = pipeline.select_block(header(1), vec![tx(1, Address::with_last_byte(1))]);
        assert!(decisions[0].result.is_permanent_rejection());
    }

    #[test]
    fn bundle_rolls_back_entirely_when_a_member_reverts_outside_reverting_set() {
        let limits = ModuleLimits::new(HashMap::from([("M".to_string(), 1_000)]));
        let config = SelectorConfig::default();
        let pricing = Arc::new(PricingSource::default());
        let pool = Arc::new(BundlePool::new(1_000_000));
        let host = Arc::new(MockHost::new("M", 1));
        *host.fail.lock() = true;
        let factory = SelectorFactory::new(limits, config);
        let mut pipeline = factory.build(pricing, pool.clone(), DenyList::empty(), host);

        let bundle = Bundle::new(
            1,
            vec![tx(1, Address::with_last_byte(1)), tx(2, Address::with_last_byte(2))],
            None,
            None,
            None,
            None,
            0,
        )
        .unwrap();
        pool.put_or_replace(bundle);

        let decisions = pipeline.select_block(header(1), Vec::new());
        assert!(decisions.iter().all(|d| !d.result.is_selected()));
    }
}
