use alloy_primitives::{Address, Bytes, U256};
use selector_core::{Transaction, TransactionType};
use selector_rpc::{DecodeError, TransactionDecoder};

/// Placeholder decoder used until a host client wires in real RLP decoding
/// and signature recovery (explicitly out of scope here, see Non-goals).
/// It never recovers a real sender, so a deployment behind
/// `--tx-pool-simulation-check-api-enabled` must replace this with a
/// decoder backed by the host's simulation API before going live.
pub struct PlaceholderDecoder;

impl TransactionDecoder for PlaceholderDecoder {
    fn decode(&self, rlp: &[u8]) -> Result<Transaction, DecodeError> {
        if rlp.is_empty() {
            return Err(DecodeError("empty transaction payload".to_string()))
        }
        Ok(Transaction {
            hash: alloy_primitives::keccak256(rlp),
            sender: Address::ZERO,
            recipient: None,
            payload: Bytes::copy_from_slice(rlp),
            gas_limit: 0,
            max_fee_per_gas: U256::ZERO,
            max_priority_fee_per_gas: U256::ZERO,
            tx_type: TransactionType::Legacy,
        })
    }
}
