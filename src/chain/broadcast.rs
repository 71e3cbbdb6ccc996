use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::WalletConfig;
use crate::error::WalletError;

/// What the broadcast service answered for an accepted transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastReceipt {
    /// Txid reported by the service, None when the body did not carry one
    pub txid: Option<String>,
    pub body: String,
}

#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Submit a raw transaction (hex). A non-success answer is `BroadcastRejected`.
    async fn broadcast(&self, raw_hex: &str) -> Result<BroadcastReceipt, WalletError>;
}

/// Bitails-style broadcast client: `POST {base}/tx/broadcast` with `{"raw": hex}`
pub struct BroadcastClient {
    client: reqwest::Client,
    base_url: String,
}

impl BroadcastClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, WalletError> {
        Ok(Self {
            client: super::http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &WalletConfig) -> Result<Self, WalletError> {
        Self::new(config.broadcast_url.clone(), config.request_timeout)
    }
}

#[async_trait]
impl Broadcaster for BroadcastClient {
    async fn broadcast(&self, raw_hex: &str) -> Result<BroadcastReceipt, WalletError> {
        let url = format!("{}/tx/broadcast", self.base_url);
        log::debug!("Broadcasting transaction to: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&json!({ "raw": raw_hex }))
            .send()
            .await
            .map_err(|e| WalletError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::new());

        if !status.is_success() {
            log::warn!("Broadcast rejected with {}: {}", status, body);
            return Err(WalletError::BroadcastRejected(format!("{}: {}", status, body)));
        }

        Ok(BroadcastReceipt {
            txid: parse_txid(&body),
            body,
        })
    }
}

/// Pull a txid out of a broadcast reply: a JSON string or an object with `txid`.
///
/// Anything else (plain text, empty body, other JSON) yields None.
pub fn parse_txid(body: &str) -> Option<String> {
    let candidate = match serde_json::from_str::<Value>(body).ok()? {
        Value::String(txid) => txid,
        Value::Object(map) => map.get("txid")?.as_str()?.to_string(),
        _ => return None,
    };

    let candidate = candidate.trim().to_lowercase();
    let is_txid = candidate.len() == 64 && candidate.chars().all(|c| c.is_ascii_hexdigit());
    is_txid.then_some(candidate)
}
