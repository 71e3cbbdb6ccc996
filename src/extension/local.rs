use async_trait::async_trait;
use bitcoin::hashes::Hash;
use bitcoin::secp256k1::{Message, Secp256k1};
use bitcoin::sign_message::{signed_msg_hash, MessageSignature};
use bitcoin::{Address, CompressedPublicKey, Network, PrivateKey};
use std::fmt;

use super::SigningExtension;
use crate::error::WalletError;

/// Extension backed by a primary-chain key held by this process.
///
/// Signs Bitcoin signed-messages (compact recoverable signature, 65 bytes) the
/// way browser extensions do, and exposes a single native segwit account.
pub struct LocalExtension {
    private_key: PrivateKey,
    address: Address,
}

impl LocalExtension {
    pub fn new(private_key: PrivateKey, network: Network) -> Result<Self, WalletError> {
        let secp = Secp256k1::new();
        let public_key = CompressedPublicKey::from_private_key(&secp, &private_key)
            .map_err(|e| WalletError::InvalidInput(format!("Primary key must be compressed: {}", e)))?;
        let address = Address::p2wpkh(&public_key, network);

        log::debug!("Local extension account: {}", address);

        Ok(Self { private_key, address })
    }

    pub fn from_wif(wif: &str, network: Network) -> Result<Self, WalletError> {
        let private_key = PrivateKey::from_wif(wif.trim())
            .map_err(|e| WalletError::InvalidInput(format!("Invalid primary WIF: {}", e)))?;
        Self::new(private_key, network)
    }

    pub fn address(&self) -> &Address {
        &self.address
    }
}

#[async_trait]
impl SigningExtension for LocalExtension {
    async fn request_accounts(&self) -> Result<Vec<String>, WalletError> {
        Ok(vec![self.address.to_string()])
    }

    async fn sign_message(&self, message: &str) -> Result<String, WalletError> {
        let secp = Secp256k1::signing_only();
        let digest = signed_msg_hash(message);
        let msg = Message::from_digest(digest.to_byte_array());

        let signature = secp.sign_ecdsa_recoverable(&msg, &self.private_key.inner);
        let signature = MessageSignature::new(signature, self.private_key.compressed);

        Ok(hex::encode(signature.serialize()))
    }
}

impl Drop for LocalExtension {
    fn drop(&mut self) {
        self.private_key.inner.non_secure_erase();
    }
}

impl fmt::Debug for LocalExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalExtension")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
