mod common;

use async_trait::async_trait;
use bitcoin::consensus::encode::deserialize;
use bitcoin::Transaction;
use common::{TestEnvironment, RECIPIENT};
use indexer_mock::{BroadcastMode, IndexerMode};
use sigwallet::chain::{BroadcastReceipt, IndexerClient};
use sigwallet::{Broadcaster, SendRequest, WalletError, WalletManager};
use std::sync::Arc;
use tokio::sync::Notify;

fn send_request(amount_sats: u64) -> SendRequest {
    SendRequest {
        to_address: RECIPIENT.to_string(),
        amount_sats,
        fee_rate_sat_b: None,
    }
}

fn decode(raw: &str) -> Transaction {
    deserialize(&hex::decode(raw).unwrap()).unwrap()
}

#[tokio::test]
async fn test_balance_sums_unspent_outputs() {
    let env = TestEnvironment::new().await.unwrap();
    let wallet = env.connect_and_generate().await;

    let empty = env.manager.get_balance().await.unwrap();
    assert_eq!(empty.total_sats, 0);
    assert_eq!(empty.utxo_count, 0);

    env.ledger.fund(&wallet.derived_address, 5_000, 820_000);
    env.ledger.fund(&wallet.derived_address, 700, 0);

    let balance = env.manager.get_balance().await.unwrap();
    assert_eq!(balance.address, wallet.derived_address);
    assert_eq!(balance.total_sats, 5_700);
    assert_eq!(balance.confirmed_sats, 5_000);
    assert_eq!(balance.unconfirmed_sats, 700);
    assert_eq!(balance.utxo_count, 2);
}

#[tokio::test]
async fn test_send_pays_recipient_and_returns_change() {
    let env = TestEnvironment::new().await.unwrap();
    let wallet = env.connect_and_generate().await;
    env.ledger.fund(&wallet.derived_address, 5_000, 1);

    let receipt = env.manager.send(send_request(1_000)).await.unwrap();

    assert_eq!(receipt.amount_sats, 1_000);
    assert_eq!(receipt.fee_sats, 1_000);
    assert_eq!(receipt.change_sats, 3_000);
    assert_eq!(receipt.from_address, wallet.derived_address);
    assert_eq!(receipt.to_address, RECIPIENT);
    assert!(receipt.acknowledged);

    let broadcasts = env.ledger.broadcasts();
    assert_eq!(broadcasts.len(), 1);
    assert!(broadcasts[0].accepted);
    assert_eq!(broadcasts[0].txid.as_deref(), Some(receipt.txid.as_str()));

    let tx = decode(&broadcasts[0].raw);
    let values: Vec<u64> = tx.output.iter().map(|o| o.value.to_sat()).collect();
    assert_eq!(values, vec![1_000, 3_000]);
    assert_eq!(tx.input.len(), 1);
    assert_eq!(tx.version.0, 1);
    assert!(tx.input[0].witness.is_empty());
    assert!(!tx.input[0].script_sig.is_empty());
}

#[tokio::test]
async fn test_insufficient_funds_never_broadcasts() {
    let env = TestEnvironment::new().await.unwrap();
    let wallet = env.connect_and_generate().await;

    let err = env.manager.send(send_request(1_000)).await.unwrap_err();
    assert!(matches!(
        err,
        WalletError::InsufficientFunds { available: 0, required: 2_000 }
    ));

    env.ledger.fund(&wallet.derived_address, 500, 1);
    let err = env.manager.send(send_request(1_000)).await.unwrap_err();
    assert!(matches!(
        err,
        WalletError::InsufficientFunds { available: 500, required: 2_000 }
    ));

    assert!(env.ledger.broadcasts().is_empty());
}

#[tokio::test]
async fn test_send_spends_every_utxo() {
    let env = TestEnvironment::new().await.unwrap();
    let wallet = env.connect_and_generate().await;
    for value in [1_200, 800, 3_000, 15_000] {
        env.ledger.fund(&wallet.derived_address, value, 1);
    }

    let receipt = env.manager.send(send_request(2_000)).await.unwrap();
    let tx = decode(&env.ledger.broadcasts()[0].raw);

    assert_eq!(tx.input.len(), 4);
    let outputs: u64 = tx.output.iter().map(|o| o.value.to_sat()).sum();
    assert_eq!(outputs, 20_000 - receipt.fee_sats);
    assert_eq!(receipt.change_sats, 20_000 - 2_000 - 1_000);
}

#[tokio::test]
async fn test_exact_amount_has_no_change_output() {
    let env = TestEnvironment::new().await.unwrap();
    let wallet = env.connect_and_generate().await;
    env.ledger.fund(&wallet.derived_address, 3_000, 1);

    let receipt = env.manager.send(send_request(2_000)).await.unwrap();
    assert_eq!(receipt.change_sats, 0);

    let tx = decode(&env.ledger.broadcasts()[0].raw);
    assert_eq!(tx.output.len(), 1);
    assert_eq!(tx.output[0].value.to_sat(), 2_000);
}

#[tokio::test]
async fn test_fee_rate_switches_to_size_based_fee() {
    let env = TestEnvironment::new().await.unwrap();
    let wallet = env.connect_and_generate().await;
    env.ledger.fund(&wallet.derived_address, 4_000, 1);
    env.ledger.fund(&wallet.derived_address, 4_000, 1);

    let mut request = send_request(1_000);
    request.fee_rate_sat_b = Some(0.5);
    let receipt = env.manager.send(request).await.unwrap();

    // 10 + 2 * 148 + 2 * 34 = 374 bytes at 0.5 sat/byte
    assert_eq!(receipt.fee_sats, 187);
    assert_eq!(receipt.change_sats, 8_000 - 1_000 - 187);

    let mut request = send_request(1_000);
    request.fee_rate_sat_b = Some(-1.0);
    assert!(matches!(
        env.manager.send(request).await,
        Err(WalletError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_broadcast_reply_without_txid_uses_local_txid() {
    let env = TestEnvironment::new().await.unwrap();
    let wallet = env.connect_and_generate().await;

    for mode in [BroadcastMode::PlainText, BroadcastMode::Empty, BroadcastMode::JsonString] {
        let acknowledged = mode == BroadcastMode::JsonString;
        env.ledger.set_broadcast_mode(mode);
        env.ledger.fund(&wallet.derived_address, 10_000, 1);

        let receipt = env.manager.send(send_request(1_000)).await.unwrap();
        let record = env.ledger.broadcasts().pop().unwrap();

        assert_eq!(receipt.acknowledged, acknowledged);
        // The mock hashes the raw bytes the same way, so both sides agree
        assert_eq!(record.txid.as_deref(), Some(receipt.txid.as_str()));
    }
}

#[tokio::test]
async fn test_rejected_broadcast_is_an_error() {
    let env = TestEnvironment::new().await.unwrap();
    let wallet = env.connect_and_generate().await;
    env.ledger.fund(&wallet.derived_address, 5_000, 1);
    env.ledger.set_broadcast_mode(BroadcastMode::Reject {
        reason: "txn-mempool-conflict".to_string(),
    });

    let err = env.manager.send(send_request(1_000)).await.unwrap_err();
    match err {
        WalletError::BroadcastRejected(body) => assert!(body.contains("txn-mempool-conflict")),
        other => panic!("unexpected error: {:?}", other),
    }

    let broadcasts = env.ledger.broadcasts();
    assert_eq!(broadcasts.len(), 1);
    assert!(!broadcasts[0].accepted);
}

#[tokio::test]
async fn test_indexer_failures_are_explicit() {
    let env = TestEnvironment::new().await.unwrap();
    let wallet = env.connect_and_generate().await;
    env.ledger.fund(&wallet.derived_address, 5_000, 1);

    env.ledger.set_indexer_mode(IndexerMode::Unavailable);
    assert!(matches!(env.manager.get_balance().await, Err(WalletError::Network(_))));
    assert!(matches!(
        env.manager.send(send_request(1_000)).await,
        Err(WalletError::Network(_))
    ));

    env.ledger.set_indexer_mode(IndexerMode::Garbage);
    assert!(matches!(env.manager.get_balance().await, Err(WalletError::Indexer(_))));
    assert!(matches!(
        env.manager.send(send_request(1_000)).await,
        Err(WalletError::Indexer(_))
    ));

    assert!(env.ledger.broadcasts().is_empty());
}

#[tokio::test]
async fn test_unreachable_indexer_is_network_error() {
    let manager = WalletManager::new(common::offline_config()).unwrap();
    let ext = common::local_extension(7);
    manager.connect(&ext).await.unwrap();
    manager.generate_wallet(&ext).await.unwrap();

    assert!(matches!(manager.get_balance().await, Err(WalletError::Network(_))));
}

#[tokio::test]
async fn test_send_requires_derived_wallet_and_valid_recipient() {
    let env = TestEnvironment::new().await.unwrap();

    assert!(matches!(
        env.manager.send(send_request(1_000)).await,
        Err(WalletError::NoDerivedWallet)
    ));
    assert!(matches!(env.manager.get_balance().await, Err(WalletError::NoDerivedWallet)));

    let wallet = env.connect_and_generate().await;
    env.ledger.fund(&wallet.derived_address, 5_000, 1);

    let mut request = send_request(1_000);
    request.to_address = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4".to_string();
    assert!(matches!(env.manager.send(request).await, Err(WalletError::InvalidInput(_))));
    assert!(matches!(
        env.manager.send(send_request(0)).await,
        Err(WalletError::InvalidInput(_))
    ));
    assert!(env.ledger.broadcasts().is_empty());
}

/// Holds every broadcast until released
struct GatedBroadcaster {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl Broadcaster for GatedBroadcaster {
    async fn broadcast(&self, raw_hex: &str) -> Result<BroadcastReceipt, WalletError> {
        self.entered.notify_one();
        self.release.notified().await;
        let tx = decode(raw_hex);
        Ok(BroadcastReceipt {
            txid: Some(tx.compute_txid().to_string()),
            body: String::new(),
        })
    }
}

#[tokio::test]
async fn test_concurrent_send_from_same_wallet_is_refused() {
    let env = TestEnvironment::new().await.unwrap();
    let broadcaster = Arc::new(GatedBroadcaster {
        entered: Notify::new(),
        release: Notify::new(),
    });
    let indexer = Arc::new(IndexerClient::from_config(&env.config).unwrap());
    let manager = Arc::new(WalletManager::with_services(
        env.config.clone(),
        indexer,
        broadcaster.clone(),
    ));

    manager.connect(&env.extension).await.unwrap();
    let wallet = manager.generate_wallet(&env.extension).await.unwrap();
    env.ledger.fund(&wallet.derived_address, 10_000, 1);

    let first = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.send(send_request(1_000)).await })
    };
    broadcaster.entered.notified().await;

    assert!(matches!(
        manager.send(send_request(1_000)).await,
        Err(WalletError::SendInProgress(_))
    ));

    broadcaster.release.notify_one();
    let receipt = first.await.unwrap().unwrap();
    assert!(receipt.acknowledged);

    // The guard is released once the first send finishes
    let second = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.send(send_request(1_000)).await })
    };
    broadcaster.entered.notified().await;
    broadcaster.release.notify_one();
    assert!(second.await.unwrap().is_ok());
}
