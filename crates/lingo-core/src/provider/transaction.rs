//! Hosted-login transaction.
//!
//! Starting a hosted login records a random `state` and `nonce` in the
//! origin store. The redirect that comes back must echo the same `state`,
//! and its id token must carry the same `nonce`; anything else was not
//! started by this page.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AuthResult, ProviderError, ProviderResult};
use crate::error::Result;
use crate::store::{PersistentStore, AUTH_TRANSACTION_KEY};

/// Random URL-safe value for `state` / `nonce`
pub fn random_state() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Pending hosted login, persisted between `authorize` and the redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTransaction {
    pub state: String,
    pub nonce: String,
}

impl AuthTransaction {
    /// Fresh transaction with random `state` and `nonce`.
    pub fn generate() -> Self {
        Self {
            state: random_state(),
            nonce: random_state(),
        }
    }

    /// Record as the pending transaction, replacing any earlier one.
    pub fn save(&self, store: &dyn PersistentStore) -> Result<()> {
        store.set(AUTH_TRANSACTION_KEY, &serde_json::to_string(self)?)
    }

    /// Pending transaction, if one was recorded and is readable.
    pub fn load(store: &dyn PersistentStore) -> Result<Option<Self>> {
        match store.get(AUTH_TRANSACTION_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw).ok()),
            None => Ok(None),
        }
    }

    /// Check a redirect result against this transaction.
    pub fn verify(&self, result: &AuthResult) -> ProviderResult<()> {
        if result.state.as_deref() != Some(self.state.as_str()) {
            return Err(invalid_state());
        }

        if result.id_token.is_some() {
            let nonce = result.id_token_payload.as_ref().and_then(|p| p.nonce.as_deref());
            if nonce != Some(self.nonce.as_str()) {
                return Err(ProviderError::new(
                    "invalid_nonce",
                    "ID token nonce does not match the login request",
                ));
            }
        }
        Ok(())
    }
}

fn invalid_state() -> ProviderError {
    ProviderError::new("invalid_state", "State does not match the login request")
}

/// Verify `result` against the transaction pending in `store` and consume
/// it on success. With no pending transaction every result is rejected.
pub fn complete(store: &dyn PersistentStore, result: &AuthResult) -> ProviderResult<()> {
    let pending = AuthTransaction::load(store).map_err(|e| {
        ProviderError::network(format!("Failed to read login transaction: {}", e))
    })?;

    let Some(transaction) = pending else {
        debug!("Redirect result without a pending login transaction");
        return Err(invalid_state());
    };
    transaction.verify(result)?;

    if let Err(e) = store.remove(AUTH_TRANSACTION_KEY) {
        debug!(error = %e, "Failed to drop completed login transaction");
    }
    Ok(())
}
