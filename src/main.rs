use sigwallet::api::{handlers::AppState, server};
use sigwallet::{LocalExtension, WalletConfig, WalletManager};
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Initialize logger (set RUST_LOG=debug for verbose output, RUST_LOG=info for normal)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = WalletConfig::from_env();

    let local_extension = match config.primary_wif.as_deref() {
        Some(wif) => {
            let extension = LocalExtension::from_wif(wif, config.network)?;
            log::info!("Local extension account: {}", extension.address());
            Some(Arc::new(extension))
        }
        None => None,
    };

    let manager = Arc::new(WalletManager::new(config)?);

    // Use BIND_ADDRESS=0.0.0.0:3000 to expose the API beyond this host
    let addr = env::var("BIND_ADDRESS").unwrap_or_else(|_| "127.0.0.1:3000".to_string());

    log::info!("Starting sigwallet server on {}", addr);
    server::start_server(&addr, AppState::new(manager, local_extension)).await?;
    Ok(())
}
