/// Indexer Mock Server
///
/// A lightweight in-memory stand-in for the unspent-listing and broadcast
/// endpoints the wallet talks to. Designed for local development.

use anyhow::{Context, Result};
use indexer_mock::{run_server, MockLedger};
use std::env;
use std::sync::Arc;

#[derive(Debug)]
struct Config {
    server_host: String,
    server_port: u16,
    /// Optional "address:value" pairs credited at startup
    seed_funds: Vec<(String, u64)>,
}

impl Config {
    fn from_env() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let server_host = env::var("SERVER_HOST")
            .unwrap_or_else(|_| "127.0.0.1".to_string());

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3001".to_string())
            .parse()
            .context("Invalid SERVER_PORT")?;

        let seed_funds = match env::var("SEED_FUNDS") {
            Ok(raw) => parse_seed_funds(&raw)?,
            Err(_) => Vec::new(),
        };

        Ok(Self {
            server_host,
            server_port,
            seed_funds,
        })
    }
}

fn parse_seed_funds(raw: &str) -> Result<Vec<(String, u64)>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|pair| {
            let (address, value) = pair
                .split_once(':')
                .with_context(|| format!("SEED_FUNDS entry '{}' is not address:value", pair))?;
            let value = value
                .parse()
                .with_context(|| format!("Invalid value in SEED_FUNDS entry '{}'", pair))?;
            Ok((address.to_string(), value))
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    log::info!("Starting Indexer Mock Server...");

    // Load configuration
    let config = Config::from_env()
        .context("Failed to load configuration")?;

    log::info!("Server will listen on {}:{}", config.server_host, config.server_port);

    let ledger = Arc::new(MockLedger::new());
    for (address, value) in &config.seed_funds {
        ledger.fund(address, *value, 1);
        log::info!("Seeded {} with {} sats", address, value);
    }

    // Run server
    run_server(ledger, config.server_host, config.server_port)
        .await
        .context("Server error")?;

    Ok(())
}
