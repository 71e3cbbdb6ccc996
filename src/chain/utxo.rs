use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::WalletConfig;
use crate::error::WalletError;

/// Unspent output as listed by the indexer.
///
/// Deserializes from the indexer's `{height, tx_pos, tx_hash, value}` entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentOutput {
    #[serde(alias = "tx_hash")]
    pub transaction_id: String,
    #[serde(alias = "tx_pos")]
    pub output_index: u32,
    #[serde(alias = "value")]
    pub value_sats: u64,
    /// 0 while unconfirmed
    #[serde(default)]
    pub height: u64,
}

impl UnspentOutput {
    pub fn is_confirmed(&self) -> bool {
        self.height > 0
    }
}

/// Sum of the listed values. The listing comes from a third party, so overflow is an indexer error.
pub fn total_value(utxos: &[UnspentOutput]) -> Result<u64, WalletError> {
    utxos
        .iter()
        .try_fold(0u64, |total, utxo| total.checked_add(utxo.value_sats))
        .ok_or_else(|| WalletError::Indexer("unspent values overflow".to_string()))
}

/// Source of unspent outputs for an address. Results are never cached.
#[async_trait]
pub trait ChainIndexer: Send + Sync {
    async fn list_unspent(&self, address: &str) -> Result<Vec<UnspentOutput>, WalletError>;
}

/// WhatsOnChain-style indexer client
pub struct IndexerClient {
    client: reqwest::Client,
    base_url: String,
}

impl IndexerClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, WalletError> {
        Ok(Self {
            client: super::http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &WalletConfig) -> Result<Self, WalletError> {
        Self::new(config.indexer_url.clone(), config.request_timeout)
    }
}

#[async_trait]
impl ChainIndexer for IndexerClient {
    async fn list_unspent(&self, address: &str) -> Result<Vec<UnspentOutput>, WalletError> {
        let url = format!("{}/address/{}/unspent", self.base_url, address);
        log::debug!("Fetching unspent outputs: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WalletError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WalletError::Network(e.to_string()))?;

        if !status.is_success() {
            log::warn!("Indexer returned {} for {}", status, address);
            return Err(WalletError::Network(format!(
                "Indexer returned {}: {}",
                status, body
            )));
        }

        let utxos: Vec<UnspentOutput> = serde_json::from_str(&body).map_err(|e| {
            log::warn!("Unparseable unspent listing for {}: {}", address, e);
            WalletError::Indexer(format!("Unexpected unspent listing: {}", e))
        })?;

        log::debug!("Indexer listed {} unspent outputs for {}", utxos.len(), address);
        Ok(utxos)
    }
}
