use serde::{Deserialize, Serialize};

pub use crate::chain::BalanceInfo;
pub use crate::derivation::WalletInfo;

/// Connect the primary-chain extension.
///
/// `address` carries the account a browser extension exposed to the client;
/// without it the server's local extension is asked.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectRequest {
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectResponse {
    pub primary_address: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChallengeResponse {
    pub primary_address: String,
    pub message: String,
}

/// Derive the wallet from a challenge signature
#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    /// Signature relayed from the browser extension, hex encoded (optional `0x`).
    ///
    /// Extensions that answer in base64 (UniSat `signMessage`) must be hex-encoded
    /// by the client first; base64 text is rejected as invalid input.
    #[serde(default)]
    pub signature: Option<String>,
    /// The user dismissed the extension's signing prompt
    #[serde(default)]
    pub rejected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRequest {
    pub to_address: String,
    pub amount_sats: u64,
    /// Sat/byte; the configured fixed fee applies when absent
    #[serde(default)]
    pub fee_rate_sat_b: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendReceipt {
    pub txid: String,
    pub amount_sats: u64,
    pub fee_sats: u64,
    pub change_sats: u64,
    pub to_address: String,
    pub from_address: String,
    /// False when the broadcast reply carried no txid and it was computed locally
    pub acknowledged: bool,
}

#[derive(Serialize, Deserialize)]
pub struct PrivateKeyResponse {
    pub address: String,
    pub wif: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignOutResponse {
    pub status: String,
}
