//! Common test utilities for wallet integration tests
//!
//! Spawns the indexer mock on an ephemeral port and builds a manager whose
//! indexer and broadcast endpoints point at it.
#![allow(dead_code)]

use bitcoin::secp256k1::SecretKey;
use bitcoin::{Network, PrivateKey};
use indexer_mock::{spawn_ephemeral, MockLedger};
use sigwallet::{LocalExtension, WalletConfig, WalletInfo, WalletManager};
use std::sync::Arc;

/// Recipient used by send tests (genesis coinbase address)
pub const RECIPIENT: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Primary-chain key standing in for the user's browser extension
pub fn local_extension(byte: u8) -> LocalExtension {
    let secret = SecretKey::from_slice(&[byte; 32]).unwrap();
    LocalExtension::new(PrivateKey::new(secret, Network::Bitcoin), Network::Bitcoin).unwrap()
}

/// Offline config: services point at a closed port
pub fn offline_config() -> WalletConfig {
    WalletConfig {
        indexer_url: "http://127.0.0.1:9".to_string(),
        broadcast_url: "http://127.0.0.1:9".to_string(),
        ..Default::default()
    }
}

/// Test environment backed by a fresh mock ledger
pub struct TestEnvironment {
    pub ledger: Arc<MockLedger>,
    pub mock_url: String,
    pub config: WalletConfig,
    pub manager: Arc<WalletManager>,
    pub extension: LocalExtension,
}

impl TestEnvironment {
    pub async fn new() -> anyhow::Result<Self> {
        init_logging();

        let ledger = Arc::new(MockLedger::new());
        let addr = spawn_ephemeral(ledger.clone()).await?;
        let mock_url = format!("http://{}", addr);

        let config = WalletConfig {
            indexer_url: mock_url.clone(),
            broadcast_url: mock_url.clone(),
            ..Default::default()
        };
        let manager = Arc::new(WalletManager::new(config.clone())?);

        Ok(Self {
            ledger,
            mock_url,
            config,
            manager,
            extension: local_extension(7),
        })
    }

    /// Connect the local extension and derive the session wallet
    pub async fn connect_and_generate(&self) -> WalletInfo {
        self.manager.connect(&self.extension).await.unwrap();
        self.manager.generate_wallet(&self.extension).await.unwrap()
    }
}
