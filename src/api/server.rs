use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{self, AppState};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        // Session
        .route("/api/wallet/connect", post(handlers::connect_handler))
        .route("/api/wallet/challenge", get(handlers::challenge_handler))
        .route("/api/wallet/generate", post(handlers::generate_wallet_handler))
        .route("/api/wallet/info", get(handlers::wallet_info_handler))
        .route(
            "/api/wallet/private-key",
            get(handlers::export_private_key_handler),
        )
        .route("/api/wallet/sign-out", post(handlers::sign_out_handler))
        // Chain
        .route("/api/wallet/balance", get(handlers::get_balance_handler))
        .route("/api/wallet/send", post(handlers::send_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS from ALLOWED_ORIGINS (comma separated).
///
/// Unset or empty means no CORS layer: the API serves the exported key, so
/// browsers only reach it from the same origin.
pub fn cors_layer(allowed_origins: Option<&str>) -> Option<CorsLayer> {
    let origins = allowed_origins.filter(|o| !o.trim().is_empty());
    let Some(origins) = origins else {
        log::info!("CORS: no ALLOWED_ORIGINS set, API is same-origin only");
        return None;
    };

    log::info!("CORS configured for origins: {}", origins);
    let origin_list: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse() {
            Ok(origin) => Some(origin),
            Err(_) => {
                log::warn!("Ignoring invalid CORS origin '{}'", s);
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(origin_list)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

/// Apply the CORS policy for `allowed_origins` to a router
pub fn with_cors(router: Router, allowed_origins: Option<&str>) -> Router {
    match cors_layer(allowed_origins) {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

pub async fn start_server(addr: &str, state: AppState) -> anyhow::Result<()> {
    let allowed_origins = std::env::var("ALLOWED_ORIGINS").ok();
    let app = with_cors(create_router(state), allowed_origins.as_deref());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            log::info!("Received SIGTERM signal");
        },
    }

    log::info!("Shutdown signal received, exiting gracefully...");
}
