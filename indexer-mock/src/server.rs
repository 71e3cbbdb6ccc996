/// Axum HTTP server setup and routing

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::*;
use crate::ledger::MockLedger;

pub fn create_router(ledger: Arc<MockLedger>) -> Router {
    // Configure CORS to allow requests from wallet frontend/tests
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Indexer endpoints
        .route("/address/:address/unspent", get(get_address_unspent))

        // Broadcast endpoints
        .route("/tx/broadcast", post(broadcast_transaction))

        // Mock control endpoints
        .route("/mock/fund", post(fund_address))
        .route("/mock/broadcast-mode", post(set_broadcast_mode))
        .route("/mock/indexer-mode", post(set_indexer_mode))
        .route("/mock/broadcasts", get(list_broadcasts))

        // Shared state
        .with_state(ledger)

        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(ledger: Arc<MockLedger>, host: String, port: u16) -> anyhow::Result<()> {
    let app = create_router(ledger);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    log::info!("🚀 Indexer mock listening on http://{}", addr);
    log::info!("💰 Funding endpoint: POST /mock/fund");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Serve the mock on 127.0.0.1 with an OS-assigned port and return the bound address.
///
/// The server task runs until the runtime shuts down, which is what integration
/// tests want.
pub async fn spawn_ephemeral(ledger: Arc<MockLedger>) -> anyhow::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = create_router(ledger);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            log::error!("Indexer mock stopped: {}", e);
        }
    });

    log::debug!("Indexer mock spawned on http://{}", addr);
    Ok(addr)
}
