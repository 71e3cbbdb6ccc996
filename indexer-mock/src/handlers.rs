/// Axum HTTP handlers for the mock indexer and broadcast endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::ledger::{BroadcastOutcome, MockLedger};
use crate::types::*;

/// Shared application state
pub type AppState = Arc<MockLedger>;

/// Custom error type for handlers
pub enum ApiError {
    BadRequest(String),
    Unavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        (status, message).into_response()
    }
}

/// GET /address/{address}/unspent
/// Returns all unspent outputs for an address
pub async fn get_address_unspent(
    State(ledger): State<AppState>,
    Path(address): Path<String>,
) -> Result<Response, ApiError> {
    if ledger.indexer_mode() == IndexerMode::Garbage {
        return Ok((StatusCode::OK, "<html>rate limited</html>").into_response());
    }

    let entries = ledger
        .unspent(&address)
        .map_err(|e| ApiError::Unavailable(e.to_string()))?;
    Ok(Json(entries).into_response())
}

/// POST /tx/broadcast
/// Accepts `{ "raw": "<hex>" }`; the reply shape follows the ledger's broadcast mode
pub async fn broadcast_transaction(
    State(ledger): State<AppState>,
    Json(req): Json<BroadcastRequest>,
) -> Result<Response, ApiError> {
    match ledger.accept_broadcast(&req.raw) {
        BroadcastOutcome::Rejected(reason) => {
            log::info!("Broadcast rejected: {}", reason);
            Err(ApiError::BadRequest(reason))
        }
        BroadcastOutcome::Accepted { txid, mode } => {
            log::info!("Broadcast accepted: {}", txid);
            let response = match mode {
                BroadcastMode::JsonTxid => Json(serde_json::json!({ "txid": txid })).into_response(),
                BroadcastMode::JsonString => Json(txid).into_response(),
                BroadcastMode::PlainText => txid.into_response(),
                BroadcastMode::Empty => StatusCode::OK.into_response(),
                // Rejection is decided by the ledger before we get here
                BroadcastMode::Reject { reason } => {
                    return Err(ApiError::BadRequest(reason));
                }
            };
            Ok(response)
        }
    }
}

// ============================================================================
// MOCK CONTROL ENDPOINTS (not part of the real indexer API)
// ============================================================================

/// POST /mock/fund
/// Credit an address with a new unspent output
pub async fn fund_address(
    State(ledger): State<AppState>,
    Json(req): Json<FundRequest>,
) -> Json<UnspentEntry> {
    Json(ledger.fund(&req.address, req.value, req.height))
}

/// POST /mock/broadcast-mode
pub async fn set_broadcast_mode(
    State(ledger): State<AppState>,
    Json(mode): Json<BroadcastMode>,
) -> StatusCode {
    ledger.set_broadcast_mode(mode);
    StatusCode::NO_CONTENT
}

/// POST /mock/indexer-mode
pub async fn set_indexer_mode(
    State(ledger): State<AppState>,
    Json(mode): Json<IndexerMode>,
) -> StatusCode {
    ledger.set_indexer_mode(mode);
    StatusCode::NO_CONTENT
}

#[derive(Debug, Serialize)]
pub struct BroadcastLog {
    pub count: usize,
    pub broadcasts: Vec<BroadcastRecord>,
}

/// GET /mock/broadcasts
pub async fn list_broadcasts(State(ledger): State<AppState>) -> Json<BroadcastLog> {
    let broadcasts = ledger.broadcasts();
    Json(BroadcastLog {
        count: broadcasts.len(),
        broadcasts,
    })
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}
