use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Signing extension unavailable: {0}")]
    ExtensionUnavailable(String),

    #[error("Signing request rejected: {0}")]
    UserRejected(String),

    #[error("No extension wallet connected")]
    NotConnected,

    #[error("No derived wallet in this session")]
    NoDerivedWallet,

    #[error("Failed to generate wallet: {0}")]
    Derivation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Bitcoin error: {0}")]
    Bitcoin(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Indexer error: {0}")]
    Indexer(String),

    #[error("Insufficient funds: available {available} sats, need {required} sats")]
    InsufficientFunds { available: u64, required: u64 },

    #[error("Broadcast rejected: {0}")]
    BroadcastRejected(String),

    #[error("A send is already in progress for {0}")]
    SendInProgress(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for WalletError {
    fn into_response(self) -> Response {
        let status = match self {
            WalletError::ExtensionUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            WalletError::UserRejected(_) => StatusCode::FORBIDDEN,
            WalletError::NotConnected | WalletError::NoDerivedWallet => StatusCode::CONFLICT,
            WalletError::Derivation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            WalletError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            WalletError::InsufficientFunds { .. } => StatusCode::BAD_REQUEST,
            WalletError::Network(_) | WalletError::Indexer(_) => StatusCode::BAD_GATEWAY,
            WalletError::BroadcastRejected(_) => StatusCode::BAD_GATEWAY,
            WalletError::SendInProgress(_) => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

impl From<reqwest::Error> for WalletError {
    fn from(err: reqwest::Error) -> Self {
        WalletError::Network(err.to_string())
    }
}
