use crate::{
    config::SelectorConfig,
    host::{HostExecutor, TransactionProcessingResult},
};
use alloy_primitives::B256;
use bundle_pool::BundlePool;
use selector_core::{
    config::DenyList, Bundle, LineCountAccumulator, ModuleLimits, PendingTransaction,
    PricingSource, ProfitabilityCalculator, ProfitabilityInputs, TransactionSelectionResult,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// The opaque pending-block header the host invokes the core with
/// (spec.md §1 Non-goals: block sealing/consensus live outside the core).
#[derive(Debug, Clone, Copy)]
pub struct PendingBlockHeader {
    pub number: u64,
    pub timestamp: u64,
    pub base_fee: alloy_primitives::U256,
}

/// One evaluated candidate's outcome, paired with its transaction hash for
/// the orchestrator to report back to the host pool.
#[derive(Debug, Clone)]
pub struct Decision {
    pub tx_hash: B256,
    pub result: TransactionSelectionResult,
}

/// Orchestrates evaluation of every candidate for one pending block:
/// bundles first in insertion order, then non-bundle pool transactions
/// (spec.md §4.4).
pub struct SelectorPipeline<H: HostExecutor> {
    config: SelectorConfig,
    accumulator: LineCountAccumulator,
    profitability: ProfitabilityCalculator,
    pricing: Arc<PricingSource>,
    bundle_pool: Arc<BundlePool>,
    deny_list: DenyList,
    host: Arc<H>,
}

impl<H: HostExecutor> SelectorPipeline<H> {
    pub fn new(
        module_limits: ModuleLimits,
        config: SelectorConfig,
        pricing: Arc<PricingSource>,
        bundle_pool: Arc<BundlePool>,
        deny_list: DenyList,
        host: Arc<H>,
    ) -> Self {
        let profitability = ProfitabilityCalculator::new(config.min_gas_price_wei);
        Self {
            accumulator: LineCountAccumulator::new(module_limits),
            config,
            profitability,
            pricing,
            bundle_pool,
            deny_list,
            host,
        }
    }

    pub fn reload_deny_list(&mut self) -> Result<(), selector_core::ConfigError> {
        self.deny_list.reload()
    }

    /// Evaluates every bundle registered for `header.number`, then every
    /// non-bundle pending transaction supplied by the host, returning one
    /// [`Decision`] per candidate transaction in evaluation order
    /// (spec.md §4.4 "Block-level selection order").
    pub fn select_block(
        &mut self,
        header: PendingBlockHeader,
        pending_txs: Vec<PendingTransaction>,
    ) -> Vec<Decision> {
        self.accumulator.reset();
        let mut decisions = Vec::new();

        for bundle in self.bundle_pool.bundles_for_block(header.number) {
            decisions.extend(self.evaluate_bundle(&header, &bundle));
        }

        for ptx in pending_txs {
            let hash = ptx.hash();
            let result = self.evaluate_single(&header, &ptx, None);
            decisions.push(Decision { tx_hash: hash, result });
        }

        decisions
    }

    fn evaluate_bundle(&mut self, header: &PendingBlockHeader, bundle: &Bundle) -> Vec<Decision> {
        let snapshot = self.host.snapshot();
        let accumulator_before = self.accumulator.clone();
        let mut decisions = Vec::with_capacity(bundle.pending_txs.len());
        let mut cumulative_gas = 0u64;
        let mut rollback = false;

        for ptx in &bundle.pending_txs {
            let hash = ptx.hash();

            if cumulative_gas + ptx.transaction.gas_limit > self.config.max_bundle_gas_per_block {
                decisions
                    .push(Decision { tx_hash: hash, result: TransactionSelectionResult::BlockOccupancyAboveThreshold });
                rollback = true;
                break
            }

            let result = self.evaluate_single(header, ptx, Some(bundle));
            let selected = result.is_selected();
            cumulative_gas += ptx.transaction.gas_limit;
            decisions.push(Decision { tx_hash: hash, result });
            if !selected {
                rollback = true;
                break
            }
        }

        if rollback {
            self.host.rollback(snapshot);
            self.accumulator = accumulator_before;
            // every member of a rolled-back bundle is reported as not
            // included; members after the failure point never ran, so we
            // mark them deferred rather than silently dropping them.
            let evaluated: std::collections::HashSet<_> =
                decisions.iter().map(|d| d.tx_hash).collect();
            for ptx in &bundle.pending_txs {
                let hash = ptx.hash();
                if !evaluated.contains(&hash) {
                    decisions.push(Decision {
                        tx_hash: hash,
                        result: TransactionSelectionResult::PreExecutionNotSelected(
                            "bundle rolled back".to_string(),
                        ),
                    });
                }
            }
        }

        decisions
    }

    fn evaluate_single(
        &mut self,
        header: &PendingBlockHeader,
        ptx: &PendingTransaction,
        bundle: Option<&Bundle>,
    ) -> TransactionSelectionResult {
        if let Some(result) = self.pre_execution_check(header, ptx, bundle) {
            return result
        }

        let snapshot = self.host.snapshot();
        let started = std::time::Instant::now();
        let processing = self.host.execute(ptx);
        if started.elapsed() > self.config.per_tx_evaluation_deadline {
            warn!(hash = %ptx.hash(), "host execution exceeded the per-transaction evaluation deadline");
            self.host.rollback(snapshot);
            return TransactionSelectionResult::EvaluationTimeout
        }

        let result = self.post_execution_check(ptx, &processing, bundle, header);
        if !result.is_selected() {
            self.host.rollback(snapshot);
        }
        result
    }

    fn pre_execution_check(
        &self,
        header: &PendingBlockHeader,
        ptx: &PendingTransaction,
        bundle: Option<&Bundle>,
    ) -> Option<TransactionSelectionResult> {
        let tx = &ptx.transaction;

        if self.deny_list.contains(&tx.sender) {
            return Some(TransactionSelectionResult::Invalid(format!(
                "sender {} is blocked as appearing on the SDN or other legally prohibited list",
                tx.sender
            )))
        }
        if let Some(recipient) = tx.recipient {
            if self.deny_list.contains(&recipient) {
                return Some(TransactionSelectionResult::Invalid(format!(
                    "recipient {recipient} is blocked as appearing on the SDN or other legally prohibited list"
                )))
            }
        }

        if !self.config.allowed_tx_types.contains(&tx.tx_type) {
            return Some(TransactionSelectionResult::Invalid(format!(
                "transaction type {:?} is not enabled",
                tx.tx_type
            )))
        }

        if tx.gas_limit > self.config.max_gas_per_tx {
            return Some(TransactionSelectionResult::TooLargeForGas)
        }

        if let Some(bundle) = bundle {
            if let Some(max_timestamp) = bundle.max_timestamp {
                if header.timestamp > max_timestamp {
                    return Some(TransactionSelectionResult::Invalid(
                        "bundle max timestamp is in the past".to_string(),
                    ))
                }
            }
            if let Some(min_timestamp) = bundle.min_timestamp {
                if header.timestamp < min_timestamp {
                    return Some(TransactionSelectionResult::PreExecutionNotSelected(
                        "bundle timestamp window not yet open".to_string(),
                    ))
                }
            }
        }

        let pricing = self.pricing.snapshot();
        if !self.is_profitable(tx, header.base_fee, &pricing) {
            return Some(TransactionSelectionResult::PreExecutionNotSelected("unprofitable".to_string()))
        }

        None
    }

    fn is_profitable(
        &self,
        tx: &selector_core::Transaction,
        base_fee: alloy_primitives::U256,
        pricing: &ProfitabilityInputs,
    ) -> bool {
        // gas_used is unknown pre-execution; fall back to the gas limit
        // per spec.md §4.2.
        let gas = tx.gas_limit;
        let compressed_size = tx.payload.len() as u64;
        self.profitability.is_profitable(
            "pre-execution",
            compressed_size,
            base_fee,
            tx.max_priority_fee_per_gas + base_fee,
            gas,
            pricing,
        )
    }

    fn post_execution_check(
        &mut self,
        ptx: &PendingTransaction,
        processing: &TransactionProcessingResult,
        bundle: Option<&Bundle>,
        _header: &PendingBlockHeader,
    ) -> TransactionSelectionResult {
        let verification = self.accumulator.verify(&processing.cumulative_module_counts);
        match verification {
            selector_core::VerificationOutcome::TxOverflow(module) => {
                warn!(module, "line count for module is above the per-transaction limit");
                return TransactionSelectionResult::Invalid(format!(
                    "line count for module {module} exceeds the per-transaction limit"
                ))
            }
            selector_core::VerificationOutcome::BlockFull(module) => {
                debug!(module, "cumulated line count is above the limit, stopping selection");
                return TransactionSelectionResult::BlockFull
            }
            selector_core::VerificationOutcome::ModuleUndefined(module) => {
                // fatal configuration error (spec.md §7); isolate the
                // failure to this candidate rather than panicking.
                warn!(module, "tracer reported a module with no configured limit");
                return TransactionSelectionResult::Invalid(format!(
                    "module {module} is not configured"
                ))
            }
            selector_core::VerificationOutcome::Valid => {}
        }

        if processing
            .invoked_precompiles
            .iter()
            .any(|addr| self.config.excluded_precompiles.contains(addr))
        {
            return TransactionSelectionResult::Invalid(
                "transaction invoked an excluded precompile".to_string(),
            )
        }

        if processing.failed {
            let revertable = bundle.is_some_and(|b| b.may_revert(&ptx.hash()));
            if bundle.is_some() && !revertable {
                return TransactionSelectionResult::Invalid(
                    "failed non-revertable transaction in bundle".to_string(),
                )
            }
        }

        self.accumulator.commit(processing.cumulative_module_counts.clone());
        TransactionSelectionResult::Selected
    }
}

/// Builds [`SelectorPipeline`] instances from configuration, mirroring
/// `mev_build_rs::service::Service::spawn` composing a `Builder`
/// (SPEC_FULL.md §4.4).
pub struct SelectorFactory {
    module_limits: ModuleLimits,
    config: SelectorConfig,
}

impl SelectorFactory {
    pub fn new(module_limits: ModuleLimits, config: SelectorConfig) -> Self {
        Self { module_limits, config }
    }

    pub fn build<H: HostExecutor>(
        &self,
        pricing: Arc<PricingSource>,
        bundle_pool: Arc<BundlePool>,
        deny_list: DenyList,
        host: Arc<H>,
    ) -> SelectorPipeline<H> {
        SelectorPipeline::new(
            self.module_limits.clone(),
            self.config.clone(),
            pricing,
            bundle_pool,
            deny_list,
            host,
        )
    }
}
