//! Identity provider client.
//!
//! Three remote operations back the session manager:
//! - `parse_redirect_result`: read credentials from a redirect fragment
//! - `login`: interactive username/password login against a realm
//! - `signup`: interactive registration against a connection
//!
//! Each resolves exactly once with a payload or a [`ProviderError`].

#[cfg(feature = "client")]
mod auth0;
pub mod fragment;
pub mod transaction;

#[cfg(feature = "client")]
pub use auth0::Auth0Client;
pub use fragment::{decode_id_token, parse_fragment};
pub use transaction::{random_state, AuthTransaction};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of a provider round trip
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Credentials returned by a successful login or redirect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResult {
    pub access_token: Option<String>,
    pub id_token: Option<String>,
    pub id_token_payload: Option<IdTokenPayload>,
    /// Provider expiry hint in seconds; sessions ignore it and use a fixed TTL.
    pub expires_in: Option<u64>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub state: Option<String>,
}

impl AuthResult {
    /// Both the access and the id credential are present.
    pub fn has_tokens(&self) -> bool {
        let present = |t: &Option<String>| t.as_deref().is_some_and(|t| !t.is_empty());
        present(&self.access_token) && present(&self.id_token)
    }

    /// Email claim from the id token, if the provider supplied one.
    pub fn email(&self) -> Option<&str> {
        self.id_token_payload
            .as_ref()
            .and_then(|p| p.email.as_deref())
            .filter(|e| !e.is_empty())
    }
}

/// Claims read from the id token (unverified).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdTokenPayload {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    /// Echo of the `nonce` sent with a hosted-login request
    #[serde(default)]
    pub nonce: Option<String>,
}

/// Error reported by the identity provider (or by the transport to it).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderError {
    /// Machine-readable code, e.g. `invalid_grant`
    pub code: Option<String>,
    /// Human-readable description from the provider
    pub description: Option<String>,
    /// Fallback message (transport failures, unparsable bodies)
    pub message: Option<String>,
    /// HTTP status, when there was a response
    pub status: Option<u16>,
}

impl ProviderError {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            description: Some(description.into()),
            ..Default::default()
        }
    }

    /// Failure that never got a usable answer from the provider.
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Description, else message, else `fallback`.
    pub fn describe(&self, fallback: &str) -> String {
        [&self.description, &self.message]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({})", self.describe("identity provider error"), code),
            None => write!(f, "{}", self.describe("identity provider error")),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Interactive login against a realm.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub realm: String,
    pub username: String,
    pub password: String,
    pub scope: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("realm", &self.realm)
            .field("username", &self.username)
            .field("password", &"***")
            .field("scope", &self.scope)
            .finish()
    }
}

/// Interactive registration against a connection.
#[derive(Clone, Serialize)]
pub struct SignupRequest {
    pub connection: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupRequest")
            .field("connection", &self.connection)
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Remote identity service used by the session manager.
///
/// Implementations may do any amount of I/O, but every call must resolve
/// exactly once.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Parse credentials (or an error) out of a redirect fragment.
    ///
    /// `Ok(None)` means the fragment carried nothing for us.
    async fn parse_redirect_result(&self, fragment: &str) -> ProviderResult<Option<AuthResult>>;

    /// Interactive login.
    async fn login(&self, request: &LoginRequest) -> ProviderResult<AuthResult>;

    /// Interactive registration. Yields no credentials.
    async fn signup(&self, request: &SignupRequest) -> ProviderResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_precedence() {
        let err = ProviderError::new("invalid_grant", "Wrong credentials");
        assert_eq!(err.describe("Login failed"), "Wrong credentials");

        let err = ProviderError::network("connection refused");
        assert_eq!(err.describe("Login failed"), "connection refused");

        let err = ProviderError {
            description: Some(" ".to_string()),
            ..Default::default()
        };
        assert_eq!(err.describe("Login failed"), "Login failed");
    }

    #[test]
    fn test_has_tokens_requires_both() {
        let mut result = AuthResult {
            access_token: Some("a".to_string()),
            ..Default::default()
        };
        assert!(!result.has_tokens());

        result.id_token = Some(String::new());
        assert!(!result.has_tokens());

        result.id_token = Some("b".to_string());
        assert!(result.has_tokens());
    }

    #[test]
    fn test_email_ignores_blank_claim() {
        let result = AuthResult {
            id_token_payload: Some(IdTokenPayload {
                email: Some(String::new()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(result.email(), None);
    }

    #[test]
    fn test_requests_hide_password() {
        let request = LoginRequest {
            realm: "Username-Password-Authentication".to_string(),
            username: "u@x.com".to_string(),
            password: "hunter2".to_string(),
            scope: "openid".to_string(),
        };
        assert!(!format!("{:?}", request).contains("hunter2"));

        let request = SignupRequest {
            connection: "Username-Password-Authentication".to_string(),
            email: "u@x.com".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{:?}", request).contains("hunter2"));
    }
}
