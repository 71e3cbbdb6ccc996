/// Wallet Manager - Orchestration Layer
///
/// Owns the session (connected primary address and derived identity) and wires
/// the derivation, balance and send operations to the injected services.
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::api::types::{PrivateKeyResponse, SendReceipt, SendRequest};
use crate::chain::{
    self, BalanceInfo, BroadcastClient, Broadcaster, ChainIndexer, FeePolicy,
    IndexerClient, SendGuard,
};
use crate::config::WalletConfig;
use crate::derivation::{self, challenge_message, WalletIdentity, WalletInfo};
use crate::error::WalletError;
use crate::extension::SigningExtension;

#[derive(Debug, Default)]
struct Session {
    primary_address: Option<String>,
    identity: Option<WalletIdentity>,
}

pub struct WalletManager {
    pub config: WalletConfig,
    indexer: Arc<dyn ChainIndexer>,
    broadcaster: Arc<dyn Broadcaster>,
    session: RwLock<Session>,
    send_guard: SendGuard,
}

impl WalletManager {
    // ============================================================================
    // Constructor
    // ============================================================================

    /// Manager talking to the indexer and broadcast services named in `config`
    pub fn new(config: WalletConfig) -> Result<Self, WalletError> {
        let indexer = Arc::new(IndexerClient::from_config(&config)?);
        let broadcaster = Arc::new(BroadcastClient::from_config(&config)?);
        Ok(Self::with_services(config, indexer, broadcaster))
    }

    pub fn with_services(
        config: WalletConfig,
        indexer: Arc<dyn ChainIndexer>,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self {
        Self {
            config,
            indexer,
            broadcaster,
            session: RwLock::new(Session::default()),
            send_guard: SendGuard::new(),
        }
    }

    // ============================================================================
    // Session
    // ============================================================================

    /// Ask the extension for its accounts and make the first one the primary address.
    ///
    /// Connecting again discards any wallet derived for the previous address.
    pub async fn connect(&self, extension: &dyn SigningExtension) -> Result<String, WalletError> {
        let accounts = extension.request_accounts().await?;
        let primary_address = accounts
            .into_iter()
            .map(|a| a.trim().to_string())
            .find(|a| !a.is_empty())
            .ok_or_else(|| {
                WalletError::ExtensionUnavailable("extension returned no accounts".to_string())
            })?;

        let mut session = self.write_session()?;
        session.primary_address = Some(primary_address.clone());
        session.identity = None;

        log::info!("Connected primary address {}", primary_address);
        Ok(primary_address)
    }

    pub fn primary_address(&self) -> Result<String, WalletError> {
        self.read_session()?
            .primary_address
            .clone()
            .ok_or(WalletError::NotConnected)
    }

    /// The message the extension must sign for the connected address
    pub fn challenge(&self) -> Result<String, WalletError> {
        let primary_address = self.primary_address()?;
        Ok(challenge_message(
            &self.config.domain_salt,
            &primary_address,
            &self.config.app_host,
        ))
    }

    /// Derive the wallet for the connected address and keep it for this session
    pub async fn generate_wallet(
        &self,
        extension: &dyn SigningExtension,
    ) -> Result<WalletInfo, WalletError> {
        let primary_address = self.primary_address()?;
        let identity =
            derivation::derive_from_extension(extension, &primary_address, &self.config).await?;
        let info = identity.info();

        let mut session = self.write_session()?;
        if session.primary_address.as_deref() != Some(primary_address.as_str()) {
            // Signed out or reconnected while the extension was signing
            return Err(WalletError::NotConnected);
        }
        session.identity = Some(identity);

        Ok(info)
    }

    pub fn wallet_info(&self) -> Result<WalletInfo, WalletError> {
        self.read_session()?
            .identity
            .as_ref()
            .map(WalletIdentity::info)
            .ok_or(WalletError::NoDerivedWallet)
    }

    pub fn export_private_key(&self) -> Result<PrivateKeyResponse, WalletError> {
        let session = self.read_session()?;
        let identity = session.identity.as_ref().ok_or(WalletError::NoDerivedWallet)?;

        log::warn!("Private key exported for {}", identity.address());
        Ok(PrivateKeyResponse {
            address: identity.address().to_string(),
            wif: identity.wif().to_string(),
        })
    }

    /// Forget the derived wallet and the connected address
    pub fn sign_out(&self) -> Result<bool, WalletError> {
        let mut session = self.write_session()?;
        let had_session = session.primary_address.is_some() || session.identity.is_some();
        *session = Session::default();

        if had_session {
            log::info!("Signed out, derived key erased");
        }
        Ok(had_session)
    }

    // ============================================================================
    // Chain operations
    // ============================================================================

    /// Balance of the derived wallet
    pub async fn get_balance(&self) -> Result<BalanceInfo, WalletError> {
        let address = self.derived_address()?;
        self.balance_of(&address).await
    }

    pub async fn balance_of(&self, address: &str) -> Result<BalanceInfo, WalletError> {
        chain::get_balance(self.indexer.as_ref(), address).await
    }

    /// Send from the derived wallet. One send per address runs at a time.
    pub async fn send(&self, request: SendRequest) -> Result<SendReceipt, WalletError> {
        let fee_policy = FeePolicy::resolve(self.config.fixed_fee_sats, request.fee_rate_sat_b)?;

        let (from_address, mut private_key) = {
            let session = self.read_session()?;
            let identity = session.identity.as_ref().ok_or(WalletError::NoDerivedWallet)?;
            (identity.address().clone(), *identity.private_key())
        };

        let _in_flight = self.send_guard.try_acquire(&from_address.to_string())?;

        let result = chain::send_payment(
            self.indexer.as_ref(),
            self.broadcaster.as_ref(),
            self.config.network,
            fee_policy,
            &request,
            &from_address,
            &private_key,
        )
        .await;

        private_key.inner.non_secure_erase();
        result
    }

    fn derived_address(&self) -> Result<String, WalletError> {
        self.read_session()?
            .identity
            .as_ref()
            .map(|identity| identity.address().to_string())
            .ok_or(WalletError::NoDerivedWallet)
    }

    fn read_session(&self) -> Result<RwLockReadGuard<'_, Session>, WalletError> {
        self.session
            .read()
            .map_err(|_| WalletError::Internal("session lock poisoned".to_string()))
    }

    fn write_session(&self) -> Result<RwLockWriteGuard<'_, Session>, WalletError> {
        self.session
            .write()
            .map_err(|_| WalletError::Internal("session lock poisoned".to_string()))
    }
}
