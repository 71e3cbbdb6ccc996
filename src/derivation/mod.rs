//! Deterministic key derivation
//!
//! - Domain-scoped challenge message
//! - Signature -> SHA-256 -> mod n -> secondary-chain key
//! - Session identity that wipes its secret on drop

pub mod challenge;
pub mod keys;

pub use challenge::challenge_message;
pub use keys::{
    decode_signature, reduce_mod_order, secret_key_from_digest, secret_key_from_signature,
    WalletIdentity, WalletInfo,
};

use crate::config::WalletConfig;
use crate::error::WalletError;
use crate::extension::SigningExtension;

/// Ask the extension to sign the challenge for `primary_address` and derive the wallet from it.
///
/// Extension failures (unavailable, rejected) are returned as-is; there is no retry.
pub async fn derive_from_extension(
    extension: &dyn SigningExtension,
    primary_address: &str,
    config: &WalletConfig,
) -> Result<WalletIdentity, WalletError> {
    let message = challenge_message(&config.domain_salt, primary_address, &config.app_host);
    log::debug!("Requesting challenge signature for {}", primary_address);

    let signature_hex = extension.sign_message(&message).await?;
    let signature = decode_signature(&signature_hex)?;

    let identity = WalletIdentity::from_signature(primary_address, &signature, config.network)?;
    log::info!(
        "Derived wallet {} for primary address {}",
        identity.address(),
        primary_address
    );

    Ok(identity)
}
