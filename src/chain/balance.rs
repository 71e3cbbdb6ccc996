use serde::{Deserialize, Serialize};

use super::utxo::{total_value, ChainIndexer, UnspentOutput};
use crate::error::WalletError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceInfo {
    pub address: String,
    pub total_sats: u64,
    pub confirmed_sats: u64,
    pub unconfirmed_sats: u64,
    pub utxo_count: usize,
    pub utxos: Vec<UnspentOutput>,
}

impl BalanceInfo {
    pub fn from_utxos(address: &str, utxos: Vec<UnspentOutput>) -> Self {
        let (confirmed_sats, unconfirmed_sats) =
            utxos.iter().fold((0u64, 0u64), |(confirmed, unconfirmed), utxo| {
                if utxo.is_confirmed() {
                    (confirmed.saturating_add(utxo.value_sats), unconfirmed)
                } else {
                    (confirmed, unconfirmed.saturating_add(utxo.value_sats))
                }
            });

        Self {
            address: address.to_string(),
            total_sats: confirmed_sats.saturating_add(unconfirmed_sats),
            confirmed_sats,
            unconfirmed_sats,
            utxo_count: utxos.len(),
            utxos,
        }
    }
}

/// Sum every unspent output the indexer lists for `address`
pub async fn get_balance(
    indexer: &dyn ChainIndexer,
    address: &str,
) -> Result<BalanceInfo, WalletError> {
    let utxos = indexer.list_unspent(address).await?;
    total_value(&utxos)?;
    let balance = BalanceInfo::from_utxos(address, utxos);

    log::info!(
        "Balance for {}: {} sats ({} confirmed, {} unconfirmed, {} utxos)",
        address,
        balance.total_sats,
        balance.confirmed_sats,
        balance.unconfirmed_sats,
        balance.utxo_count
    );

    Ok(balance)
}
