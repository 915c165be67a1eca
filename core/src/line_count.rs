use std::collections::HashMap;

/// A fixed mapping from module name to its positive per-block line-count
/// ceiling. Loaded once from the `traces-limits` TOML table (spec.md §6)
/// and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct ModuleLimits(HashMap<String, u64>);

impl ModuleLimits {
    pub fn new(limits: HashMap<String, u64>) -> Self {
        Self(limits)
    }

    pub fn get(&self, module: &str) -> Option<u64> {
        self.0.get(module).copied()
    }

    pub fn contains(&self, module: &str) -> bool {
        self.0.contains_key(module)
    }
}

/// Running per-module totals for the block currently under construction.
pub type AccumulatedCounts = HashMap<String, u64>;

/// Result of checking whether committing a candidate's line-count delta
/// would fit under the configured limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Valid,
    /// The delta introduced by this single transaction alone exceeds the
    /// module's limit: permanently reject the candidate.
    TxOverflow(String),
    /// The delta fits, but the cumulative total for this block would not:
    /// defer the candidate to a later block.
    BlockFull(String),
    /// The tracer reported a module the operator never configured a limit
    /// for: a fatal configuration error.
    ModuleUndefined(String),
}

impl VerificationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Maintains the per-block cumulative module line counts and decides, for
/// each post-execution candidate, whether inclusion is permitted
/// (spec.md §4.1).
#[derive(Debug, Clone)]
pub struct LineCountAccumulator {
    limits: ModuleLimits,
    current: AccumulatedCounts,
}

impl LineCountAccumulator {
    pub fn new(limits: ModuleLimits) -> Self {
        Self { limits, current: AccumulatedCounts::new() }
    }

    pub fn current(&self) -> &AccumulatedCounts {
        &self.current
    }

    /// Purely functional: does not mutate `self`. `new_totals` is the total
    /// counts that would result were the current candidate committed.
    pub fn verify(&self, new_totals: &AccumulatedCounts) -> VerificationOutcome {
        for (module, &total) in new_totals {
            let Some(limit) = self.limits.get(module) else {
                return VerificationOutcome::ModuleUndefined(module.clone())
            };
            let current = self.current.get(module).copied().unwrap_or(0);
            // a tracer reporting a smaller total than what we've already
            // committed is a contract violation; we don't detect it here,
            // per spec.md §4.1 "tie-breaks and edge cases".
            let delta = total.saturating_sub(current);
            if delta > limit {
                return VerificationOutcome::TxOverflow(module.clone())
            }
            if total > limit {
                return VerificationOutcome::BlockFull(module.clone())
            }
        }
        VerificationOutcome::Valid
    }

    /// Replace current counts with `new_totals`; only called after a
    /// successful `verify` and host confirmation that the candidate was
    /// executed.
    pub fn commit(&mut self, new_totals: AccumulatedCounts) {
        for (module, total) in new_totals {
            self.current.insert(module, total);
        }
    }

    pub fn reset(&mut self) {
        self.current.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> ModuleLimits {
        ModuleLimits::new(HashMap::from([
            ("PRECOMPILE_MODEXP_EFFECTIVE_CALLS".to_string(), 10_000),
            ("PRECOMPILE_ECPAIRING_FINAL_EXPONENTIATIONS".to_string(), 16),
        ]))
    }

    #[test]
    fn verify_reports_valid_when_within_limits() {
        let acc = LineCountAccumulator::new(limits());
        let totals = AccumulatedCounts::from([("PRECOMPILE_MODEXP_EFFECTIVE_CALLS".into(), 5)]);
        assert_eq!(acc.verify(&totals), VerificationOutcome::Valid);
    }

    #[test]
    fn verify_reports_tx_overflow_when_single_delta_exceeds_limit() {
        let acc = LineCountAccumulator::new(limits());
        let totals =
            AccumulatedCounts::from([("PRECOMPILE_MODEXP_EFFECTIVE_CALLS".into(), 2_147_483_647)]);
        assert_eq!(
            acc.verify(&totals),
            VerificationOutcome::TxOverflow("PRECOMPILE_MODEXP_EFFECTIVE_CALLS".into())
        );
    }

    #[test]
    fn verify_reports_block_full_when_cumulative_total_exceeds_limit() {
        let mut acc = LineCountAccumulator::new(limits());
        for n in 1..=16u64 {
            let totals =
                AccumulatedCounts::from([("PRECOMPILE_ECPAIRING_FINAL_EXPONENTIATIONS".into(), n)]);
            assert_eq!(acc.verify(&totals), VerificationOutcome::Valid);
            acc.commit(totals);
        }
        let totals =
            AccumulatedCounts::from([("PRECOMPILE_ECPAIRING_FINAL_EXPONENTIATIONS".into(), 17)]);
        assert_eq!(
            acc.verify(&totals),
            VerificationOutcome::BlockFull("PRECOMPILE_ECPAIRING_FINAL_EXPONENTIATIONS".into())
        );
    }

    #[test]
    fn verify_reports_module_undefined_for_unknown_modules() {
        let acc = LineCountAccumulator::new(limits());
        let totals = AccumulatedCounts::from([("PRECOMPILE_UNKNOWN".into(), 1)]);
        assert_eq!(
            acc.verify(&totals),
            VerificationOutcome::ModuleUndefined("PRECOMPILE_UNKNOWN".into())
        );
    }

    #[test]
    fn commit_is_monotonic_across_a_sequence_of_verify_then_commit() {
        let mut acc = LineCountAccumulator::new(limits());
        let mut expected = 0u64;
        for delta in [10, 20, 30] {
            expected += delta;
            let totals =
                AccumulatedCounts::from([("PRECOMPILE_MODEXP_EFFECTIVE_CALLS".into(), expected)]);
            assert!(acc.verify(&totals).is_valid());
            acc.commit(totals);
        }
        assert_eq!(acc.current().get("PRECOMPILE_MODEXP_EFFECTIVE_CALLS"), Some(&60));
    }

    #[test]
    fn reset_clears_all_counts() {
        let mut acc = LineCountAccumulator::new(limits());
        acc.commit(AccumulatedCounts::from([("PRECOMPILE_MODEXP_EFFECTIVE_CALLS".into(), 5)]));
        acc.reset();
        assert!(acc.current().is_empty());
    }
}
