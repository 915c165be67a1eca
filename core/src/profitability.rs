use alloy_primitives::U256;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Fixed/variable cost pair sourced from pricing bytes carried in incoming
/// block headers. Parsing those bytes is outside the core; this struct
/// receives already-structured values (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfitabilityInputs {
    pub fixed_cost_wei: U256,
    pub variable_cost_wei: U256,
    pub min_margin_ratio: U256,
    pub extra_data_pricing_enabled: bool,
}

impl Default for ProfitabilityInputs {
    fn default() -> Self {
        Self {
            fixed_cost_wei: U256::ZERO,
            variable_cost_wei: U256::ZERO,
            min_margin_ratio: U256::from(1),
            extra_data_pricing_enabled: false,
        }
    }
}

/// Holds the current [`ProfitabilityInputs`] behind a lock so that a
/// selection round can take a stable snapshot while an external pricing
/// update swaps fixed and variable cost atomically together
/// (spec.md §3, §9).
#[derive(Debug, Default)]
pub struct PricingSource {
    inputs: RwLock<ProfitabilityInputs>,
}

impl PricingSource {
    pub fn new(inputs: ProfitabilityInputs) -> Self {
        Self { inputs: RwLock::new(inputs) }
    }

    pub fn snapshot(&self) -> ProfitabilityInputs {
        *self.inputs.read()
    }

    pub fn update(&self, inputs: ProfitabilityInputs) {
        *self.inputs.write() = inputs;
    }
}

/// Computes a lower-bound profitable priority fee per gas for a transaction
/// and decides whether an offered price meets it (spec.md §4.2).
///
/// `compressed_size` comes from an external compressor the host supplies;
/// the core treats it as an opaque positive integer, same as line counts.
#[derive(Debug, Clone)]
pub struct ProfitabilityCalculator {
    min_gas_price_wei: U256,
}

impl ProfitabilityCalculator {
    pub fn new(min_gas_price_wei: U256) -> Self {
        Self { min_gas_price_wei }
    }

    pub fn profitable_priority_fee(
        &self,
        compressed_size: u64,
        gas: u64,
        pricing: &ProfitabilityInputs,
    ) -> U256 {
        let variable_cost = if pricing.extra_data_pricing_enabled {
            pricing.variable_cost_wei
        } else {
            self.min_gas_price_wei
        };
        let gas = U256::from(gas.max(1));
        let compressed_size = U256::from(compressed_size);
        let per_gas_cost = (variable_cost * compressed_size) / gas + pricing.fixed_cost_wei;
        pricing.min_margin_ratio * per_gas_cost
    }

    /// Returns `true` iff `paying_gas_price >= base_fee + profitable_priority_fee`.
    /// Never fails; records the margin ratio as a `tracing` field for
    /// observability rather than a dedicated metrics crate (SPEC_FULL §4.2).
    #[allow(clippy::too_many_arguments)]
    pub fn is_profitable(
        &self,
        ctx_label: &str,
        compressed_size: u64,
        base_fee: U256,
        paying_gas_price: U256,
        gas: u64,
        pricing: &ProfitabilityInputs,
    ) -> bool {
        let required_priority_fee = self.profitable_priority_fee(compressed_size, gas, pricing);
        let required_price = base_fee + required_priority_fee;
        let ratio = if required_price.is_zero() {
            f64::INFINITY
        } else {
            // f64 domain only for the observability ratio; saturate rather
            // than panic on values above u128::MAX.
            paying_gas_price.saturating_to::<u128>() as f64 / required_price.saturating_to::<u128>() as f64
        };
        debug!(ctx_label, ratio, "computed profitability margin");
        paying_gas_price >= required_price
    }
}

pub type SharedPricingSource = Arc<PricingSource>;
