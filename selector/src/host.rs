use alloy_primitives::Address;
use selector_core::{AccumulatedCounts, PendingTransaction};

/// Outcome the host reports back after executing a candidate against a
/// tentative state delta (spec.md §4.4 step 2).
#[derive(Debug, Clone, Default)]
pub struct TransactionProcessingResult {
    pub failed: bool,
    pub gas_used: u64,
    pub cumulative_module_counts: AccumulatedCounts,
    /// Precompile addresses invoked by this transaction, used by the
    /// excluded-precompile post-check (spec.md §4.4 step 3b).
    pub invoked_precompiles: Vec<Address>,
    /// Size of the transaction's RLP once run through the host's external
    /// compressor; feeds the profitability calculation (spec.md §4.2).
    pub compressed_size: u64,
}

/// Opaque handle to a point the host can later roll execution back to.
/// The core never inspects its contents (Non-goal: state DB).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot(pub u64);

/// The EVM executor and state database the core consumes but does not own
/// (spec.md §1 Non-goals). Implementations are supplied by the host client.
pub trait HostExecutor: Send + Sync {
    /// Executes `tx` against the current tentative state delta.
    fn execute(&self, tx: &PendingTransaction) -> TransactionProcessingResult;

    /// Takes a snapshot of the tentative state delta, to be restored by
    /// [`HostExecutor::rollback`] if a bundle's member fails
    /// (spec.md §4.4 "Bundle group semantics").
    fn snapshot(&self) -> Snapshot;

    /// Discards all state changes made since `snapshot`.
    fn rollback(&self, snapshot: Snapshot);
}
