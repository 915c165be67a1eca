use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Tag for the EIP transaction envelope a [`Transaction`] was submitted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionType {
    Legacy,
    AccessList,
    FeeMarket,
    Blob,
}

/// An opaque, signed transaction as handed to the core by the host client.
///
/// The core never verifies signatures or recovers addresses; `sender` is
/// assumed already recovered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub hash: B256,
    pub sender: Address,
    pub recipient: Option<Address>,
    pub payload: Bytes,
    pub gas_limit: u64,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub tx_type: TransactionType,
}

impl Transaction {
    pub fn rlp_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.payload))
    }
}

/// A [`Transaction`] plus the host's bookkeeping of when it arrived.
///
/// `arrival` is observability-only: it never participates in selection
/// order, which is fixed by bundle-then-pool-iteration-order (spec.md §4.4).
#[derive(Debug, Clone)]
pub struct PendingTransaction {
    pub transaction: Transaction,
    pub arrival: SystemTime,
}

impl PendingTransaction {
    pub fn new(transaction: Transaction) -> Self {
        Self { transaction, arrival: SystemTime::now() }
    }

    pub fn hash(&self) -> B256 {
        self.transaction.hash
    }
}

/// An atomic, user-submitted group of transactions that must be included
/// together in a specific block, or not at all.
#[derive(Debug, Clone)]
pub struct Bundle {
    pub bundle_id: B256,
    pub block_number: u64,
    pub pending_txs: Vec<PendingTransaction>,
    pub min_timestamp: Option<u64>,
    pub max_timestamp: Option<u64>,
    pub reverting_tx_hashes: Option<Vec<B256>>,
    pub replacement_uuid: Option<uuid::Uuid>,
    pub sequence: u64,
}

impl Bundle {
    /// Builds a [`Bundle`], computing `bundle_id` and validating the
    /// invariants from spec.md §3: non-empty `pending_txs`, non-zero
    /// `block_number`, and `min_timestamp <= max_timestamp` when both are
    /// present.
    pub fn new(
        block_number: u64,
        pending_txs: Vec<PendingTransaction>,
        min_timestamp: Option<u64>,
        max_timestamp: Option<u64>,
        reverting_tx_hashes: Option<Vec<B256>>,
        replacement_uuid: Option<uuid::Uuid>,
        sequence: u64,
    ) -> Result<Self, crate::Error> {
        if pending_txs.is_empty() {
            return Err(crate::Error::EmptyBundle)
        }
        if block_number == 0 {
            return Err(crate::Error::MalformedBundleParam)
        }
        if let (Some(min), Some(max)) = (min_timestamp, max_timestamp) {
            if min > max {
                return Err(crate::Error::MalformedBundleParam)
            }
        }
        let bundle_id = Self::compute_id(&pending_txs, replacement_uuid);
        Ok(Self {
            bundle_id,
            block_number,
            pending_txs,
            min_timestamp,
            max_timestamp,
            reverting_tx_hashes,
            replacement_uuid,
            sequence,
        })
    }

    /// `bundle_id = keccak(concat of pending_tx encodings)` unless a
    /// `replacement_uuid` is present, in which case identity is derived
    /// from the UUID so replacements share it (spec.md §3).
    pub fn compute_id(pending_txs: &[PendingTransaction], replacement_uuid: Option<uuid::Uuid>) -> B256 {
        if let Some(uuid) = replacement_uuid {
            alloy_primitives::keccak256(uuid.as_bytes())
        } else {
            let mut buf = Vec::new();
            for tx in pending_txs {
                buf.extend_from_slice(tx.transaction.hash.as_slice());
                buf.extend_from_slice(&tx.transaction.payload);
            }
            alloy_primitives::keccak256(buf)
        }
    }

    /// Total payload bytes across all member transactions; the pool's
    /// admission weight (spec.md §4.3).
    pub fn weight(&self) -> usize {
        self.pending_txs.iter().map(|tx| tx.transaction.payload.len()).sum()
    }

    pub fn may_revert(&self, hash: &B256) -> bool {
        self.reverting_tx_hashes.as_ref().is_some_and(|hashes| hashes.contains(hash))
    }

    pub fn key(&self) -> B256 {
        self.bundle_id
    }
}

/// Outcome of evaluating a single candidate for inclusion in the block
/// under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionSelectionResult {
    Selected,
    Invalid(String),
    TooLargeForGas,
    BlockOccupancyAboveThreshold,
    BlobsFull,
    EvaluationTimeout,
    BlockFull,
    PreExecutionNotSelected(String),
}

impl TransactionSelectionResult {
    pub fn is_selected(&self) -> bool {
        matches!(self, Self::Selected)
    }

    /// Permanent outcomes drop the candidate from the host's pool; every
    /// other outcome leaves it there to be retried on a later block.
    pub fn is_permanent_rejection(&self) -> bool {
        matches!(self, Self::Invalid(_) | Self::TooLargeForGas | Self::BlobsFull)
    }
}

/// Stage at which a rejection was observed, carried through to the
/// [`RejectionReport`] for the external endpoint in spec.md §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RejectionStage {
    Sequencer,
    Rpc,
    P2p,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleOverflow {
    pub module: String,
    pub count: u64,
    pub limit: u64,
}

/// Notification persisted by the [`crate::config`]-configured reporter and
/// forwarded to the `linea_saveRejectedTransactionV1` endpoint (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectionReport {
    pub rejection_stage: RejectionStage,
    pub timestamp: u64,
    pub block_number: Option<u64>,
    pub transaction_rlp: String,
    pub reason: String,
    pub overflows: Vec<ModuleOverflow>,
}
