/// In-memory ledger backing the mock endpoints
///
/// Replaces a real indexer with a map of address -> unspent entries and keeps
/// a log of every broadcast attempt so tests can assert on what was sent.

use anyhow::{bail, Result};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::types::*;

#[derive(Default)]
struct LedgerState {
    unspent: HashMap<String, Vec<UnspentEntry>>,
    broadcasts: Vec<BroadcastRecord>,
    broadcast_mode: BroadcastMode,
    indexer_mode: IndexerMode,
    funding_counter: u64,
}

/// Outcome of a broadcast as decided by the current `BroadcastMode`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastOutcome {
    Accepted { txid: String, mode: BroadcastMode },
    Rejected(String),
}

#[derive(Default)]
pub struct MockLedger {
    state: Mutex<LedgerState>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LedgerState> {
        // A panicking test thread must not wedge every other request
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Credit `address` with a new synthetic output and return it
    pub fn fund(&self, address: &str, value: u64, height: u64) -> UnspentEntry {
        let mut state = self.lock();
        state.funding_counter += 1;

        let seed = format!("fund:{}:{}", address, state.funding_counter);
        let entry = UnspentEntry {
            height,
            tx_pos: 0,
            tx_hash: hex::encode(Sha256::digest(seed.as_bytes())),
            value,
        };

        state
            .unspent
            .entry(address.to_string())
            .or_default()
            .push(entry.clone());

        log::debug!("Funded {} with {} sats ({})", address, value, entry.tx_hash);
        entry
    }

    /// Replace the unspent set of an address wholesale
    pub fn set_unspent(&self, address: &str, entries: Vec<UnspentEntry>) {
        self.lock().unspent.insert(address.to_string(), entries);
    }

    pub fn unspent(&self, address: &str) -> Result<Vec<UnspentEntry>> {
        let state = self.lock();
        if state.indexer_mode == IndexerMode::Unavailable {
            bail!("indexer unavailable");
        }
        Ok(state.unspent.get(address).cloned().unwrap_or_default())
    }

    pub fn indexer_mode(&self) -> IndexerMode {
        self.lock().indexer_mode
    }

    pub fn set_indexer_mode(&self, mode: IndexerMode) {
        self.lock().indexer_mode = mode;
    }

    pub fn set_broadcast_mode(&self, mode: BroadcastMode) {
        self.lock().broadcast_mode = mode;
    }

    /// Every broadcast attempt seen so far, in arrival order
    pub fn broadcasts(&self) -> Vec<BroadcastRecord> {
        self.lock().broadcasts.clone()
    }

    /// Record a broadcast attempt and decide the reply
    pub fn accept_broadcast(&self, raw: &str) -> BroadcastOutcome {
        let txid = txid_from_hex(raw);
        let mut state = self.lock();
        let mode = state.broadcast_mode.clone();

        let outcome = match (&txid, &mode) {
            (None, _) => BroadcastOutcome::Rejected("raw transaction is not valid hex".to_string()),
            (Some(_), BroadcastMode::Reject { reason }) => BroadcastOutcome::Rejected(reason.clone()),
            (Some(txid), mode) => BroadcastOutcome::Accepted {
                txid: txid.clone(),
                mode: mode.clone(),
            },
        };

        state.broadcasts.push(BroadcastRecord {
            raw: raw.to_string(),
            txid,
            accepted: matches!(outcome, BroadcastOutcome::Accepted { .. }),
        });

        outcome
    }
}

/// Double-SHA256 of the raw bytes, byte-reversed for display
fn txid_from_hex(raw: &str) -> Option<String> {
    let bytes = hex::decode(raw).ok()?;
    if bytes.is_empty() {
        return None;
    }
    let mut hash = Sha256::digest(Sha256::digest(&bytes)).to_vec();
    hash.reverse();
    Some(hex::encode(hash))
}
