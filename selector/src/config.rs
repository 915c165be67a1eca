use alloy_primitives::{Address, U256};
use selector_core::TransactionType;
use std::{collections::HashSet, time::Duration};

/// Wiring for one [`crate::SelectorPipeline`] instance, analogous to
/// `mev_build_rs::service::Config` composing a `Builder` from a config
/// struct (SPEC_FULL.md §4.4).
#[derive(Debug, Clone)]
pub struct SelectorConfig {
    pub max_gas_per_tx: u64,
    pub max_bundle_gas_per_block: u64,
    pub allowed_tx_types: HashSet<TransactionType>,
    pub excluded_precompiles: HashSet<Address>,
    pub min_gas_price_wei: U256,
    pub per_tx_evaluation_deadline: Duration,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            max_gas_per_tx: 30_000_000,
            max_bundle_gas_per_block: 30_000_000,
            allowed_tx_types: HashSet::from([
                TransactionType::Legacy,
                TransactionType::AccessList,
                TransactionType::FeeMarket,
            ]),
            excluded_precompiles: HashSet::new(),
            min_gas_price_wei: U256::from(1_000_000_000u64),
            per_tx_evaluation_deadline: Duration::from_millis(1_500),
        }
    }
}
