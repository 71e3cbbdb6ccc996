use bitcoin::hashes::{sha256, Hash};
use bitcoin::secp256k1::{constants::CURVE_ORDER, Secp256k1, SecretKey};
use bitcoin::{Address, Network, PrivateKey, PublicKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

use crate::error::WalletError;

/// Reduce a 256-bit big-endian integer modulo the secp256k1 group order.
///
/// Every 256-bit value is below 2n, so at most one subtraction is needed.
pub fn reduce_mod_order(digest: [u8; 32]) -> [u8; 32] {
    if digest < CURVE_ORDER {
        return digest;
    }

    let mut reduced = [0u8; 32];
    let mut borrow = 0u16;
    for i in (0..32).rev() {
        let subtrahend = CURVE_ORDER[i] as u16 + borrow;
        let minuend = digest[i] as u16;
        if minuend >= subtrahend {
            reduced[i] = (minuend - subtrahend) as u8;
            borrow = 0;
        } else {
            reduced[i] = (minuend + 256 - subtrahend) as u8;
            borrow = 1;
        }
    }
    reduced
}

/// Turn a 32-byte digest into a secret key, reducing it into the scalar field first
pub fn secret_key_from_digest(digest: [u8; 32]) -> Result<SecretKey, WalletError> {
    let reduced = Zeroizing::new(reduce_mod_order(digest));
    // Only a reduced value of zero is rejected here
    SecretKey::from_slice(reduced.as_slice())
        .map_err(|_| WalletError::Derivation("signature digest reduces to zero".to_string()))
}

/// SHA-256 the raw signature bytes and reduce the digest into a secret key
pub fn secret_key_from_signature(signature: &[u8]) -> Result<SecretKey, WalletError> {
    let digest = Zeroizing::new(sha256::Hash::hash(signature).to_byte_array());
    secret_key_from_digest(*digest)
}

/// Decode the extension's hex signature into raw bytes
pub fn decode_signature(signature_hex: &str) -> Result<Vec<u8>, WalletError> {
    let trimmed = signature_hex.trim();
    let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);

    if trimmed.is_empty() {
        return Err(WalletError::InvalidInput("extension returned an empty signature".to_string()));
    }

    hex::decode(trimmed)
        .map_err(|e| WalletError::InvalidInput(format!("signature is not valid hex: {}", e)))
}

/// Secondary-chain wallet derived for one session.
///
/// Lives in memory only. The secret scalar is erased when the identity is dropped,
/// which is how sign-out destroys it.
pub struct WalletIdentity {
    primary_address: String,
    address: Address,
    public_key: PublicKey,
    private_key: PrivateKey,
    network: Network,
    derived_at: DateTime<Utc>,
}

impl WalletIdentity {
    /// Derive the identity from the signature the extension produced over the challenge
    pub fn from_signature(
        primary_address: &str,
        signature: &[u8],
        network: Network,
    ) -> Result<Self, WalletError> {
        let secret_key = secret_key_from_signature(signature)?;
        Ok(Self::from_secret_key(primary_address, secret_key, network))
    }

    pub fn from_secret_key(primary_address: &str, secret_key: SecretKey, network: Network) -> Self {
        let secp = Secp256k1::new();
        let private_key = PrivateKey::new(secret_key, network);
        let public_key = PublicKey::from_private_key(&secp, &private_key);
        let address = Address::p2pkh(public_key.pubkey_hash(), network);

        Self {
            primary_address: primary_address.to_string(),
            address,
            public_key,
            private_key,
            network,
            derived_at: Utc::now(),
        }
    }

    pub fn primary_address(&self) -> &str {
        &self.primary_address
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// WIF encoding of the private key, wiped from memory when dropped
    pub fn wif(&self) -> Zeroizing<String> {
        Zeroizing::new(self.private_key.to_wif())
    }

    /// Public view, safe to serialize
    pub fn info(&self) -> WalletInfo {
        WalletInfo {
            primary_address: self.primary_address.clone(),
            derived_address: self.address.to_string(),
            derived_public_key: self.public_key.to_string(),
            network: self.network.to_string(),
            derived_at: self.derived_at,
        }
    }
}

impl Drop for WalletIdentity {
    fn drop(&mut self) {
        self.private_key.inner.non_secure_erase();
    }
}

impl fmt::Debug for WalletIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletIdentity")
            .field("primary_address", &self.primary_address)
            .field("address", &self.address)
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletInfo {
    pub primary_address: String,
    pub derived_address: String,
    pub derived_public_key: String,
    pub network: String,
    pub derived_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    fn order_plus(n: u8) -> [u8; 32] {
        let mut value = CURVE_ORDER;
        // The low byte of the order is 0x41, so small additions do not carry
        value[31] += n;
        value
    }

    #[test]
    fn test_values_below_order_are_unchanged() {
        let mut digest = [0u8; 32];
        digest[31] = 7;
        assert_eq!(reduce_mod_order(digest), digest);

        let mut just_below = CURVE_ORDER;
        just_below[31] -= 1;
        assert_eq!(reduce_mod_order(just_below), just_below);
    }

    #[test]
    fn test_values_above_order_wrap() {
        let mut five = [0u8; 32];
        five[31] = 5;
        assert_eq!(reduce_mod_order(order_plus(5)), five);
        assert_eq!(reduce_mod_order(CURVE_ORDER), [0u8; 32]);

        let max = [0xffu8; 32];
        assert_eq!(
            hex::encode(reduce_mod_order(max)),
            "000000000000000000000000000000014551231950b75fc4402da1732fc9bebe"
        );
    }

    #[test]
    fn test_reduced_value_is_always_below_order() {
        let mut rng = rand::thread_rng();
        for _ in 0..10_000 {
            let mut digest = [0u8; 32];
            rng.fill_bytes(&mut digest);
            let reduced = reduce_mod_order(digest);
            assert!(reduced < CURVE_ORDER, "{} not reduced", hex::encode(digest));
            if digest < CURVE_ORDER {
                assert_eq!(reduced, digest);
            }
        }

        // Random bytes almost never land above the order; force that branch too
        for _ in 0..1_000 {
            let mut digest = [0xffu8; 32];
            rng.fill_bytes(&mut digest[16..]);
            assert!(digest > CURVE_ORDER);
            assert!(reduce_mod_order(digest) < CURVE_ORDER);
        }
    }

    #[test]
    fn test_zero_after_reduction_is_rejected() {
        let err = secret_key_from_digest(CURVE_ORDER).unwrap_err();
        assert!(matches!(err, WalletError::Derivation(_)));
        assert!(secret_key_from_digest(order_plus(1)).is_ok());
    }

    #[test]
    fn test_secret_is_sha256_of_signature() {
        // SHA-256("abc") is below the order, so it is used as-is
        let key = secret_key_from_signature(b"abc").unwrap();
        assert_eq!(
            hex::encode(key.secret_bytes()),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_identity_for_scalar_one() {
        let secret = secret_key_from_digest(order_plus(1)).unwrap();
        let identity = WalletIdentity::from_secret_key("bc1qprimary", secret, Network::Bitcoin);

        assert_eq!(
            identity.public_key().to_string(),
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
        assert_eq!(identity.address().to_string(), "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH");
        assert_eq!(
            identity.wif().as_str(),
            "KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgd9M7rFU73sVHnoWn"
        );
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let signature = decode_signature("1f0a0b0c0d0e0f").unwrap();
        let a = WalletIdentity::from_signature("bc1qprimary", &signature, Network::Bitcoin).unwrap();
        let b = WalletIdentity::from_signature("bc1qprimary", &signature, Network::Bitcoin).unwrap();

        assert_eq!(a.wif().as_str(), b.wif().as_str());
        assert_eq!(a.public_key(), b.public_key());
        assert_eq!(a.address(), b.address());

        let other = WalletIdentity::from_signature("bc1qprimary", &[0x1f, 0x0a], Network::Bitcoin).unwrap();
        assert_ne!(a.address(), other.address());
    }

    #[test]
    fn test_testnet_identity_uses_testnet_prefixes() {
        let identity = WalletIdentity::from_signature("tb1qprimary", b"abc", Network::Testnet).unwrap();
        let address = identity.address().to_string();
        assert!(address.starts_with('m') || address.starts_with('n'));
        assert!(identity.wif().starts_with('c'));
        assert_eq!(identity.info().network, "testnet");
    }

    #[test]
    fn test_decode_signature_rejects_bad_input() {
        assert!(matches!(decode_signature(""), Err(WalletError::InvalidInput(_))));
        assert!(matches!(decode_signature("0x"), Err(WalletError::InvalidInput(_))));
        assert!(matches!(decode_signature("abc"), Err(WalletError::InvalidInput(_))));
        assert!(matches!(decode_signature("zz"), Err(WalletError::InvalidInput(_))));
        assert_eq!(decode_signature(" 0xA0ff ").unwrap(), vec![0xa0, 0xff]);

        // Base64 as returned by some extensions is not accepted
        let base64 = "H9L5yLFjti0QTHhPyFrZCT1V/MMnBtXKmoiKDZ78NDBjERki6ZTQZdSMCtkgoNmp17By9ItJr8o7ChX0XxY91nk=";
        assert!(matches!(decode_signature(base64), Err(WalletError::InvalidInput(_))));
    }

    #[test]
    fn test_debug_omits_secret() {
        let identity = WalletIdentity::from_signature("bc1qprimary", b"abc", Network::Bitcoin).unwrap();
        let rendered = format!("{:?}", identity);
        assert!(!rendered.contains(identity.wif().as_str()));
        assert!(!rendered.contains("ba7816bf"));
    }
}
