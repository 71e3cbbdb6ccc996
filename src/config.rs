/// Wallet configuration from environment variables
///
/// Controls the BSV network, the indexer and broadcast endpoints, the fee
/// applied to sends and the values baked into the derivation challenge.
/// Defaults match the public WhatsOnChain / Bitails mainnet services.

use bitcoin::Network;
use std::env;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_FIXED_FEE_SATS: u64 = 1_000;
pub const DEFAULT_DOMAIN_SALT: &str = "com.yourdomain.bsvwallet.v1";
pub const DEFAULT_APP_HOST: &str = "localhost";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct WalletConfig {
    /// Address/WIF network kind. BSV shares Bitcoin's base58 prefixes.
    pub network: Network,
    /// Base URL serving `/address/{addr}/unspent`
    pub indexer_url: String,
    /// Base URL serving `/tx/broadcast`
    pub broadcast_url: String,
    /// Fee used when a send does not carry an explicit fee rate
    pub fixed_fee_sats: u64,
    /// Salt prefixed to the derivation challenge
    pub domain_salt: String,
    /// Host name the challenge is scoped to
    pub app_host: String,
    /// Primary-chain key backing the local signing extension
    pub primary_wif: Option<String>,
    pub request_timeout: Duration,
}

impl WalletConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `BSV_NETWORK`: "main" (default) or "test"
    /// - `INDEXER_URL`: unspent-listing service (defaults to WhatsOnChain for the network)
    /// - `BROADCAST_URL`: broadcast service (defaults to Bitails for the network)
    /// - `FIXED_FEE_SATS`: fee for sends without a fee rate (default 1000)
    /// - `DOMAIN_SALT`, `APP_HOST`: challenge scoping
    /// - `PRIMARY_WIF`: optional primary-chain key for the local extension
    /// - `REQUEST_TIMEOUT_SECS`: HTTP timeout for indexer and broadcast calls (default 30)
    ///
    /// # Examples
    ///
    /// ```bash
    /// # Mainnet defaults
    /// cargo run
    ///
    /// # Local indexer mock
    /// INDEXER_URL=http://localhost:3001 BROADCAST_URL=http://localhost:3001 cargo run
    /// ```
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`WalletConfig::from_env`] with an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let network_str = lookup("BSV_NETWORK")
            .unwrap_or_else(|| "main".to_string())
            .to_lowercase();

        let network = match network_str.as_str() {
            "main" | "mainnet" | "" => {
                log::info!("🌐 Using BSV MAINNET");
                Network::Bitcoin
            }
            "test" | "testnet" => {
                log::info!("🔧 Using BSV TESTNET");
                Network::Testnet
            }
            other => {
                log::warn!("⚠️  Unknown network '{}', defaulting to mainnet", other);
                Network::Bitcoin
            }
        };

        let indexer_url = lookup("INDEXER_URL")
            .unwrap_or_else(|| default_indexer_url(network).to_string());
        log::info!("📡 Indexer URL: {}", indexer_url);

        let broadcast_url = lookup("BROADCAST_URL")
            .unwrap_or_else(|| default_broadcast_url(network).to_string());
        log::info!("📡 Broadcast URL: {}", broadcast_url);

        let fixed_fee_sats = parse_or_default(&lookup, "FIXED_FEE_SATS", DEFAULT_FIXED_FEE_SATS);
        let timeout_secs = parse_or_default(&lookup, "REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS);

        let domain_salt = lookup("DOMAIN_SALT").unwrap_or_else(|| DEFAULT_DOMAIN_SALT.to_string());
        let app_host = lookup("APP_HOST").unwrap_or_else(|| DEFAULT_APP_HOST.to_string());

        let primary_wif = lookup("PRIMARY_WIF").filter(|s| !s.trim().is_empty());
        if primary_wif.is_some() {
            log::info!("🔑 Local signing extension enabled");
        }

        Self {
            network,
            indexer_url: indexer_url.trim_end_matches('/').to_string(),
            broadcast_url: broadcast_url.trim_end_matches('/').to_string(),
            fixed_fee_sats,
            domain_salt,
            app_host,
            primary_wif,
            request_timeout: Duration::from_secs(timeout_secs),
        }
    }
}

fn parse_or_default<F>(lookup: &F, key: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("⚠️  Invalid {} '{}', using {}", key, raw, default);
            default
        }),
        None => default,
    }
}

fn default_indexer_url(network: Network) -> &'static str {
    match network {
        Network::Bitcoin => "https://api.whatsonchain.com/v1/bsv/main",
        _ => "https://api.whatsonchain.com/v1/bsv/test",
    }
}

fn default_broadcast_url(network: Network) -> &'static str {
    match network {
        Network::Bitcoin => "https://api.bitails.io",
        _ => "https://test-api.bitails.io",
    }
}

impl Default for WalletConfig {
    /// Default configuration (mainnet, public services)
    fn default() -> Self {
        Self {
            network: Network::Bitcoin,
            indexer_url: default_indexer_url(Network::Bitcoin).to_string(),
            broadcast_url: default_broadcast_url(Network::Bitcoin).to_string(),
            fixed_fee_sats: DEFAULT_FIXED_FEE_SATS,
            domain_salt: DEFAULT_DOMAIN_SALT.to_string(),
            app_host: DEFAULT_APP_HOST.to_string(),
            primary_wif: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletConfig")
            .field("network", &self.network)
            .field("indexer_url", &self.indexer_url)
            .field("broadcast_url", &self.broadcast_url)
            .field("fixed_fee_sats", &self.fixed_fee_sats)
            .field("domain_salt", &self.domain_salt)
            .field("app_host", &self.app_host)
            .field("primary_wif", &self.primary_wif.as_ref().map(|_| "<redacted>"))
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
