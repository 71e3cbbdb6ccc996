//! sigwallet: a BSV wallet derived from a Bitcoin extension signature
//!
//! The user connects a primary-chain (BTC) extension wallet, signs a fixed
//! domain-scoped challenge, and the signature deterministically becomes the
//! private key of a secondary-chain (BSV) P2PKH wallet. The same extension
//! account on the same site always lands on the same BSV address.
//!
//! # Architecture
//!
//! - **Derivation**: challenge text, SHA-256 of the signature reduced modulo n
//! - **Extension**: `SigningExtension` capability (local key or relayed browser response)
//! - **Chain**: unspent listing, balance, FORKID signing and broadcast
//! - **Manager / API**: session orchestration behind an axum JSON API
//!
//! # Example
//!
//! ```ignore
//! use sigwallet::{LocalExtension, WalletConfig, WalletManager};
//!
//! let config = WalletConfig::from_env();
//! let manager = WalletManager::new(config.clone())?;
//! let extension = LocalExtension::from_wif(&primary_wif, config.network)?;
//!
//! manager.connect(&extension).await?;
//! let wallet = manager.generate_wallet(&extension).await?;
//! let balance = manager.get_balance().await?;
//! println!("{} holds {} sats", wallet.derived_address, balance.total_sats);
//! ```

// Public modules
pub mod api;
pub mod chain;
pub mod config;
pub mod derivation;
pub mod error;
pub mod extension;
pub mod manager;

// Re-exports
pub use api::types::{SendReceipt, SendRequest};
pub use chain::{BalanceInfo, ChainIndexer, Broadcaster, FeePolicy, UnspentOutput};
pub use config::WalletConfig;
pub use derivation::{challenge_message, WalletIdentity, WalletInfo};
pub use error::WalletError;
pub use extension::{LocalExtension, RelayedExtension, SigningExtension};
pub use manager::WalletManager;
