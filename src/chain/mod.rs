//! Secondary-chain plumbing: unspent listing, balances, transaction building,
//! broadcast and the send flow tying them together.

pub mod balance;
pub mod broadcast;
pub mod send;
pub mod transaction;
pub mod utxo;

pub use balance::{get_balance, BalanceInfo};
pub use broadcast::{parse_txid, BroadcastClient, BroadcastReceipt, Broadcaster};
pub use send::{send_payment, InFlightSend, PendingSend, SendGuard};
pub use transaction::{estimate_tx_size, FeePolicy, TransactionBuilder, SIGHASH_ALL_FORKID};
pub use utxo::{total_value, ChainIndexer, IndexerClient, UnspentOutput};

use std::time::Duration;

use crate::error::WalletError;

/// Shared reqwest client construction for the indexer and broadcast services
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, WalletError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| WalletError::Internal(format!("Failed to build HTTP client: {}", e)))
}
