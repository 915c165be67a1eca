use alloy_primitives::B256;
use serde::Deserialize;
use uuid::Uuid;

/// Wire shape of the single `linea_sendBundle` param object (spec.md §6).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendBundleParams {
    pub txs: Vec<String>,
    pub block_number: u64,
    #[serde(default)]
    pub min_timestamp: Option<u64>,
    #[serde(default)]
    pub max_timestamp: Option<u64>,
    #[serde(default)]
    pub reverting_tx_hashes: Option<Vec<B256>>,
    #[serde(default)]
    pub replacement_uuid: Option<Uuid>,
}

/// Wire shape of the `linea_cancelBundle` param object (spec.md §6).
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelBundleParams {
    pub replacement_uuid: Uuid,
}
