use axum::{extract::State, Json};
use std::sync::Arc;

use super::types::*;
use crate::error::WalletError;
use crate::extension::{LocalExtension, RelayedExtension, SigningExtension};
use crate::manager::WalletManager;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<WalletManager>,
    /// Server-side extension used when the client relays nothing
    pub local_extension: Option<Arc<LocalExtension>>,
}

impl AppState {
    pub fn new(manager: Arc<WalletManager>, local_extension: Option<Arc<LocalExtension>>) -> Self {
        Self {
            manager,
            local_extension,
        }
    }

    fn local(&self) -> Result<&dyn SigningExtension, WalletError> {
        self.local_extension
            .as_deref()
            .map(|ext| ext as &dyn SigningExtension)
            .ok_or_else(|| {
                WalletError::ExtensionUnavailable(
                    "no extension response was relayed and no local extension is configured"
                        .to_string(),
                )
            })
    }
}

pub async fn health_handler() -> &'static str {
    "OK"
}

pub async fn connect_handler(
    State(state): State<AppState>,
    Json(req): Json<ConnectRequest>,
) -> Result<Json<ConnectResponse>, WalletError> {
    let relayed;
    let extension = match req.address {
        Some(address) => {
            relayed = RelayedExtension::with_account(address);
            &relayed as &dyn SigningExtension
        }
        None => state.local()?,
    };

    let primary_address = state.manager.connect(extension).await?;
    Ok(Json(ConnectResponse { primary_address }))
}

pub async fn challenge_handler(
    State(state): State<AppState>,
) -> Result<Json<ChallengeResponse>, WalletError> {
    let primary_address = state.manager.primary_address()?;
    let message = state.manager.challenge()?;
    Ok(Json(ChallengeResponse {
        primary_address,
        message,
    }))
}

pub async fn generate_wallet_handler(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<WalletInfo>, WalletError> {
    let relayed;
    let extension = if req.rejected {
        relayed = RelayedExtension::rejected();
        &relayed as &dyn SigningExtension
    } else if let Some(signature) = req.signature {
        relayed = RelayedExtension::with_signature(signature);
        &relayed as &dyn SigningExtension
    } else {
        state.local()?
    };

    let info = state.manager.generate_wallet(extension).await?;
    Ok(Json(info))
}

pub async fn wallet_info_handler(
    State(state): State<AppState>,
) -> Result<Json<WalletInfo>, WalletError> {
    Ok(Json(state.manager.wallet_info()?))
}

pub async fn get_balance_handler(
    State(state): State<AppState>,
) -> Result<Json<BalanceInfo>, WalletError> {
    let balance = state.manager.get_balance().await?;
    Ok(Json(balance))
}

pub async fn send_handler(
    State(state): State<AppState>,
    Json(req): Json<SendRequest>,
) -> Result<Json<SendReceipt>, WalletError> {
    let receipt = state.manager.send(req).await?;
    Ok(Json(receipt))
}

pub async fn export_private_key_handler(
    State(state): State<AppState>,
) -> Result<Json<PrivateKeyResponse>, WalletError> {
    Ok(Json(state.manager.export_private_key()?))
}

pub async fn sign_out_handler(
    State(state): State<AppState>,
) -> Result<Json<SignOutResponse>, WalletError> {
    let had_session = state.manager.sign_out()?;
    Ok(Json(SignOutResponse {
        status: if had_session { "signed_out" } else { "no_session" }.to_string(),
    }))
}
