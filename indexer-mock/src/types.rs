/// Indexer and broadcast wire types
///
/// Field names follow the WhatsOnChain unspent listing and the Bitails
/// broadcast request so that wallet clients consume them unchanged.

use serde::{Deserialize, Serialize};

/// Entry returned by GET /address/{address}/unspent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentEntry {
    /// Block height, 0 while the funding transaction is unconfirmed
    pub height: u64,
    pub tx_pos: u32,
    pub tx_hash: String,
    pub value: u64,
}

/// Body of POST /tx/broadcast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastRequest {
    pub raw: String,
}

/// How the mock answers an accepted broadcast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BroadcastMode {
    /// `{"txid": "<txid>"}`
    JsonTxid,
    /// `"<txid>"`
    JsonString,
    /// Bare txid text, not JSON
    PlainText,
    /// 200 with an empty body
    Empty,
    /// 400 with the given reason as body
    Reject { reason: String },
}

impl Default for BroadcastMode {
    fn default() -> Self {
        BroadcastMode::JsonTxid
    }
}

/// How the mock answers unspent queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexerMode {
    Normal,
    /// 503 for every query
    Unavailable,
    /// 200 with a body that is not an unspent listing
    Garbage,
}

impl Default for IndexerMode {
    fn default() -> Self {
        IndexerMode::Normal
    }
}

/// POST /mock/fund (not part of the real indexer API)
#[derive(Debug, Deserialize)]
pub struct FundRequest {
    pub address: String,
    pub value: u64,
    #[serde(default)]
    pub height: u64,
}

/// A broadcast the mock has seen, accepted or not
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastRecord {
    pub raw: String,
    /// Double-SHA256 txid in display order, None when `raw` was not hex
    pub txid: Option<String>,
    pub accepted: bool,
}
