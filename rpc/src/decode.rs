use selector_core::Transaction;

/// Turns a raw, signed RLP-encoded transaction submitted over
/// `linea_sendBundle` into the decoded, sender-recovered form the core
/// operates on. Decoding and signature recovery are host concerns (the
/// selection engine never touches EVM/RLP types directly), so the RPC
/// layer is generic over this trait rather than shipping a decoder.
pub trait TransactionDecoder: Send + Sync {
    fn decode(&self, rlp: &[u8]) -> Result<Transaction, DecodeError>;
}

#[derive(Debug, thiserror::Error)]
#[error("could not decode transaction: {0}")]
pub struct DecodeError(pub String);
