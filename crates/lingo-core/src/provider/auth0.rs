//! HTTP client for the hosted identity provider.
//!
//! # Usage
//!
//! ```rust,no_run
//! use lingo_core::config::ProviderConfig;
//! use lingo_core::provider::Auth0Client;
//!
//! fn main() -> lingo_core::Result<()> {
//!     let client = Auth0Client::new(ProviderConfig::for_host("localhost"))?;
//!     println!("{}", client.authorize_url("state", "nonce")?);
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use super::{
    decode_id_token, parse_fragment, transaction, AuthResult, AuthTransaction, IdentityProvider,
    LoginRequest, ProviderError, ProviderResult, SignupRequest,
};
use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::store::PersistentStore;

/// Grant used for username/password login against a named realm
const PASSWORD_REALM_GRANT: &str = "http://auth0.com/oauth/grant-type/password-realm";

/// Identity provider client speaking the hosted provider's HTTP protocol
#[derive(Clone)]
pub struct Auth0Client {
    config: ProviderConfig,
    /// `https://<domain>` unless overridden
    base_url: String,
    client: reqwest::Client,
    /// Where pending hosted-login transactions live
    transactions: Option<Arc<dyn PersistentStore>>,
}

impl Auth0Client {
    /// Create a client for `config`.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: format!("https://{}", config.domain),
            config,
            client,
            transactions: None,
        })
    }

    /// Point the client at a different server (local mocks, staging).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Keep hosted-login transactions in `store`. Without one, no redirect
    /// result is ever accepted.
    pub fn with_transaction_store(mut self, store: Arc<dyn PersistentStore>) -> Self {
        self.transactions = Some(store);
        self
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Start a hosted login: record a fresh transaction and return the
    /// URL to send the user to.
    pub fn begin_login(&self) -> Result<Url> {
        let store = self
            .transactions
            .as_ref()
            .ok_or_else(|| Error::Config("no transaction store configured".to_string()))?;

        let transaction = AuthTransaction::generate();
        transaction.save(store.as_ref())?;
        debug!("Recorded hosted login transaction");
        self.authorize_url(&transaction.state, &transaction.nonce)
    }

    /// Hosted login page URL; the provider redirects back to
    /// `redirect_uri` with the credentials in the fragment.
    pub fn authorize_url(&self, state: &str, nonce: &str) -> Result<Url> {
        let url = Url::parse_with_params(
            &format!("{}/authorize", self.base_url),
            &[
                ("client_id", self.config.client_id.as_str()),
                ("response_type", self.config.response_type.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", self.config.scope.as_str()),
                ("state", state),
                ("nonce", nonce),
            ],
        )?;
        Ok(url)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // HTTP Helpers
    // ─────────────────────────────────────────────────────────────────────────

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ProviderResult<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Identity provider request: POST {}", url);

        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::network(format!("Request to identity provider failed: {}", e)))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("Failed to read provider response: {}", e)))?;

        if status.is_success() {
            let text = if text.trim().is_empty() { "null" } else { text.as_str() };
            serde_json::from_str(text).map_err(|e| {
                ProviderError::network(format!("Failed to parse provider response: {}", e))
            })
        } else {
            let err = error_from_body(status.as_u16(), &text);
            warn!(status = status.as_u16(), code = ?err.code, "Identity provider rejected request");
            Err(err)
        }
    }
}

#[async_trait]
impl IdentityProvider for Auth0Client {
    async fn parse_redirect_result(&self, fragment: &str) -> ProviderResult<Option<AuthResult>> {
        let Some(result) = parse_fragment(fragment)? else {
            return Ok(None);
        };

        match &self.transactions {
            Some(store) => transaction::complete(store.as_ref(), &result)?,
            None => {
                warn!("Redirect result received without a transaction store");
                return Err(ProviderError::new(
                    "invalid_state",
                    "State does not match the login request",
                ));
            }
        }
        Ok(Some(result))
    }

    async fn login(&self, request: &LoginRequest) -> ProviderResult<AuthResult> {
        let body = serde_json::json!({
            "grant_type": PASSWORD_REALM_GRANT,
            "client_id": self.config.client_id,
            "username": request.username,
            "password": request.password,
            "realm": request.realm,
            "scope": request.scope,
        });

        let token: TokenResponse = self.post("/oauth/token", &body).await?;
        let id_token_payload = decode_id_token(&token.id_token)?;

        Ok(AuthResult {
            access_token: Some(token.access_token),
            id_token: Some(token.id_token),
            id_token_payload: Some(id_token_payload),
            expires_in: token.expires_in,
            token_type: token.token_type,
            scope: token.scope,
            state: None,
        })
    }

    async fn signup(&self, request: &SignupRequest) -> ProviderResult<()> {
        let body = serde_json::json!({
            "client_id": self.config.client_id,
            "email": request.email,
            "password": request.password,
            "connection": request.connection,
        });

        let _: serde_json::Value = self.post("/dbconnections/signup", &body).await?;
        Ok(())
    }
}

/// Map a non-2xx body onto a provider error.
///
/// The token endpoint answers `{error, error_description}`; the signup
/// endpoint answers `{code, description, name, message}` where
/// `description` may be an object (password policy failures).
fn error_from_body(status: u16, text: &str) -> ProviderError {
    match serde_json::from_str::<ErrorBody>(text) {
        Ok(body) => {
            let description = body.error_description.or(match body.description {
                Some(serde_json::Value::String(s)) => Some(s),
                _ => None,
            });
            ProviderError {
                code: body.code.or(body.error).or(body.name),
                description,
                message: body.message,
                status: Some(status),
            }
        }
        Err(_) => {
            let trimmed = text.trim();
            ProviderError {
                message: Some(if trimmed.is_empty() {
                    format!("HTTP {}", status)
                } else {
                    format!("HTTP {}: {}", status, trimmed)
                }),
                status: Some(status),
                ..Default::default()
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire Types
// ─────────────────────────────────────────────────────────────────────────────

/// Token endpoint success response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    id_token: String,
    expires_in: Option<u64>,
    token_type: Option<String>,
    scope: Option<String>,
}

/// Union of the provider's error body shapes
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    code: Option<String>,
    description: Option<serde_json::Value>,
    name: Option<String>,
    message: Option<String>,
}
