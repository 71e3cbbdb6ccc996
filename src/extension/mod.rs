//! Primary-chain signing extension
//!
//! The wallet never holds the primary-chain key itself. It asks an extension for
//! the account address and for a signature over the derivation challenge.

pub mod local;
pub mod relayed;

pub use local::LocalExtension;
pub use relayed::RelayedExtension;

use async_trait::async_trait;

use crate::error::WalletError;

#[async_trait]
pub trait SigningExtension: Send + Sync {
    /// Addresses the user exposes to this site. The first one is the primary address.
    async fn request_accounts(&self) -> Result<Vec<String>, WalletError>;

    /// Sign `message` and return the signature as hex
    async fn sign_message(&self, message: &str) -> Result<String, WalletError>;
}
