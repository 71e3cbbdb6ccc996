//! Payment sending

use bitcoin::consensus::encode::serialize_hex;
use bitcoin::{Address, Network, PrivateKey};
use std::collections::HashSet;
use std::sync::Mutex;

use super::broadcast::Broadcaster;
use super::transaction::{FeePolicy, TransactionBuilder};
use super::utxo::{total_value, ChainIndexer};
use crate::api::types::{SendReceipt, SendRequest};
use crate::error::WalletError;

/// The send being assembled. Lives for one `send_payment` call.
#[derive(Debug, Clone)]
pub struct PendingSend {
    pub recipient: Address,
    pub amount_sats: u64,
    pub fee_sats: u64,
}

/// Allows one send at a time per sender address
#[derive(Debug, Default)]
pub struct SendGuard {
    in_flight: Mutex<HashSet<String>>,
}

impl SendGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `address` until the returned handle is dropped
    pub fn try_acquire(&self, address: &str) -> Result<InFlightSend<'_>, WalletError> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !in_flight.insert(address.to_string()) {
            return Err(WalletError::SendInProgress(address.to_string()));
        }
        Ok(InFlightSend {
            guard: self,
            address: address.to_string(),
        })
    }

    pub fn is_in_flight(&self, address: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(address)
    }
}

/// Releases the sender address on drop
#[derive(Debug)]
pub struct InFlightSend<'a> {
    guard: &'a SendGuard,
    address: String,
}

impl Drop for InFlightSend<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.guard.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        in_flight.remove(&self.address);
    }
}

/// Send `request.amount_sats` from `from_address`, spending all of its unspent outputs.
///
/// Nothing is built or broadcast unless the outputs cover amount plus fee.
pub async fn send_payment(
    indexer: &dyn ChainIndexer,
    broadcaster: &dyn Broadcaster,
    network: Network,
    fee_policy: FeePolicy,
    request: &SendRequest,
    from_address: &Address,
    private_key: &PrivateKey,
) -> Result<SendReceipt, WalletError> {
    log::info!(
        "Sending {} sats from {} to {}",
        request.amount_sats,
        from_address,
        request.to_address
    );

    if request.amount_sats == 0 {
        return Err(WalletError::InvalidInput("Amount must be greater than zero".to_string()));
    }

    let tx_builder = TransactionBuilder::new(network);
    let recipient = tx_builder.parse_address(&request.to_address)?;

    let utxos = indexer.list_unspent(&from_address.to_string()).await?;
    let total_input = total_value(&utxos)?;

    let pending = PendingSend {
        recipient,
        amount_sats: request.amount_sats,
        fee_sats: fee_policy.fee_for(utxos.len(), 2),
    };

    let required = pending.amount_sats.saturating_add(pending.fee_sats);
    if utxos.is_empty() || total_input < required {
        log::warn!(
            "Insufficient funds in {}: {} sats available, {} sats required",
            from_address,
            total_input,
            required
        );
        return Err(WalletError::InsufficientFunds {
            available: total_input,
            required,
        });
    }

    let tx = tx_builder.build_send_tx(
        &utxos,
        &pending.recipient,
        pending.amount_sats,
        from_address,
        pending.fee_sats,
    )?;
    let signed_tx = tx_builder.sign_transaction(tx, &utxos, private_key)?;

    let raw_hex = serialize_hex(&signed_tx);
    let local_txid = signed_tx.compute_txid().to_string();

    let receipt = broadcaster.broadcast(&raw_hex).await?;
    let (txid, acknowledged) = match receipt.txid {
        Some(txid) => {
            if txid != local_txid {
                log::warn!("Broadcast service reported txid {} but transaction hashes to {}", txid, local_txid);
            }
            (txid, true)
        }
        None => {
            log::warn!("Broadcast reply carried no txid, using locally computed {}", local_txid);
            (local_txid, false)
        }
    };

    let change_sats = total_input - required;
    log::info!(
        "Sent - txid: {}, amount: {} sats, fee: {} sats, change: {} sats",
        txid,
        pending.amount_sats,
        pending.fee_sats,
        change_sats
    );

    Ok(SendReceipt {
        txid,
        amount_sats: pending.amount_sats,
        fee_sats: pending.fee_sats,
        change_sats,
        to_address: pending.recipient.to_string(),
        from_address: from_address.to_string(),
        acknowledged,
    })
}
