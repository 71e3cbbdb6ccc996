use async_trait::async_trait;

use super::SigningExtension;
use crate::error::WalletError;

/// Account and signature relayed by an API client that talked to a real
/// browser extension on the user's side.
#[derive(Debug, Clone, Default)]
pub struct RelayedExtension {
    accounts: Vec<String>,
    signature: Option<String>,
    rejected: bool,
}

impl RelayedExtension {
    pub fn with_account(address: impl Into<String>) -> Self {
        Self {
            accounts: vec![address.into()],
            ..Default::default()
        }
    }

    pub fn with_signature(signature: impl Into<String>) -> Self {
        Self {
            signature: Some(signature.into()),
            ..Default::default()
        }
    }

    /// The user dismissed the signing prompt
    pub fn rejected() -> Self {
        Self {
            rejected: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl SigningExtension for RelayedExtension {
    async fn request_accounts(&self) -> Result<Vec<String>, WalletError> {
        if self.rejected {
            return Err(WalletError::UserRejected("account access denied".to_string()));
        }
        if self.accounts.is_empty() {
            return Err(WalletError::ExtensionUnavailable("no account was relayed".to_string()));
        }
        Ok(self.accounts.clone())
    }

    async fn sign_message(&self, _message: &str) -> Result<String, WalletError> {
        if self.rejected {
            return Err(WalletError::UserRejected("signature request denied".to_string()));
        }
        self.signature
            .clone()
            .ok_or_else(|| WalletError::ExtensionUnavailable("no signature was relayed".to_string()))
    }
}
