//! Signing account resolution.

use std::{sync::Arc, time::Duration};

use alloy::primitives::Address;

use super::node::NodeRpc;
use crate::error::{AppError, Result};

/// Resolves and unlocks the account that signs a transaction.
///
/// Keys stay on the node; this only picks the account and asks the node to
/// unlock it.
#[derive(Clone)]
pub struct AccountManager {
    node: Arc<dyn NodeRpc>,
    /// Account used when the caller names none.
    fueling_account: Address,
    /// Password used when the caller gives none.
    default_password: String,
    /// Unlock window requested from the node.
    unlock_duration: Duration,
}

impl AccountManager {
    /// Create an account manager.
    pub fn new(
        node: Arc<dyn NodeRpc>,
        fueling_account: Address,
        default_password: impl Into<String>,
        unlock_duration: Duration,
    ) -> Self {
        Self { node, fueling_account, default_password: default_password.into(), unlock_duration }
    }

    /// The fueling account.
    pub fn fueling_account(&self) -> Address {
        self.fueling_account
    }

    /// Account and password that would sign for `account`.
    ///
    /// Without an account the fueling account and the default password are
    /// used, whatever password was given.
    pub fn signer_for<'a>(
        &'a self,
        account: Option<Address>,
        password: Option<&'a str>,
    ) -> (Address, &'a str) {
        match account {
            None => (self.fueling_account, &self.default_password),
            Some(account) => (account, password.unwrap_or(&self.default_password)),
        }
    }

    /// Resolve the signing account and unlock it on the node.
    ///
    /// Fails when the node cannot be reached or refuses the unlock, so no
    /// transaction is built for a locked account.
    pub async fn resolve_account(
        &self,
        account: Option<Address>,
        password: Option<&str>,
    ) -> Result<Address> {
        let (account, password) = self.signer_for(account, password);

        tracing::debug!(account = %account, "Unlocking account");

        let unlocked = self
            .node
            .unlock_account(account, password, self.unlock_duration)
            .await
            .map_err(|e| match e {
                AppError::AccountUnlock { .. } => e,
                other => {
                    tracing::warn!(account = %account, error = %other, "Unlock request failed");
                    AppError::AccountUnlock { account, reason: other.to_string() }
                }
            })?;
        if !unlocked {
            tracing::warn!(account = %account, "Node refused to unlock account");
            return Err(AppError::AccountUnlock {
                account,
                reason: "node refused the unlock request".into(),
            });
        }

        Ok(account)
    }
}

impl std::fmt::Debug for AccountManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountManager")
            .field("fueling_account", &self.fueling_account)
            .field("unlock_duration", &self.unlock_duration)
            .finish()
    }
}
