//! Identity provider configuration.
//!
//! The provider endpoint is fixed at construction; only the redirect target
//! depends on where the page is served from.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identity provider domain
pub const DEFAULT_DOMAIN: &str = "login.golingoapp.com";

/// Public client identifier registered with the provider
pub const DEFAULT_CLIENT_ID: &str = "CAbDNnKwXbemnPuMqg6R7ElN4F77IRA3";

/// Implicit grant: tokens come back in the redirect fragment
pub const RESPONSE_TYPE: &str = "token id_token";

/// Database connection used for both login (realm) and signup
pub const PASSWORD_CONNECTION: &str = "Username-Password-Authentication";

/// Scopes requested on interactive login
pub const DEFAULT_SCOPE: &str = "openid profile email";

/// Redirect target while developing locally
pub const LOCAL_REDIRECT_URI: &str = "http://localhost:5173";

/// Redirect target for the deployed portal
pub const PRODUCTION_REDIRECT_URI: &str = "https://vendor.golingoapp.com";

/// Settings for the identity provider client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider domain (no scheme)
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Client identifier
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Requested response modality
    #[serde(default = "default_response_type")]
    pub response_type: String,

    /// Where the provider sends the browser back to
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    /// Realm for interactive login
    #[serde(default = "default_connection")]
    pub realm: String,

    /// Connection for interactive signup
    #[serde(default = "default_connection")]
    pub connection: String,

    /// Requested scope set
    #[serde(default = "default_scope")]
    pub scope: String,
}

fn default_domain() -> String {
    DEFAULT_DOMAIN.to_string()
}

fn default_client_id() -> String {
    DEFAULT_CLIENT_ID.to_string()
}

fn default_response_type() -> String {
    RESPONSE_TYPE.to_string()
}

fn default_redirect_uri() -> String {
    PRODUCTION_REDIRECT_URI.to_string()
}

fn default_connection() -> String {
    PASSWORD_CONNECTION.to_string()
}

fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

/// Pick the redirect target for the host the page is served from.
pub fn redirect_uri_for_host(host: &str) -> &'static str {
    if host == "localhost" {
        LOCAL_REDIRECT_URI
    } else {
        PRODUCTION_REDIRECT_URI
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            client_id: default_client_id(),
            response_type: default_response_type(),
            redirect_uri: default_redirect_uri(),
            realm: default_connection(),
            connection: default_connection(),
            scope: default_scope(),
        }
    }
}

impl ProviderConfig {
    /// Default configuration with the redirect target chosen from `host`.
    pub fn for_host(host: &str) -> Self {
        Self {
            redirect_uri: redirect_uri_for_host(host).to_string(),
            ..Self::default()
        }
    }

    /// Reject configurations with blank required fields.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("domain", &self.domain),
            ("client_id", &self.client_id),
            ("response_type", &self.response_type),
            ("redirect_uri", &self.redirect_uri),
            ("realm", &self.realm),
            ("connection", &self.connection),
            ("scope", &self.scope),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("provider {} must not be empty", name)));
            }
        }
        if self.domain.contains("://") {
            return Err(Error::Config(format!(
                "provider domain must not include a scheme: {}",
                self.domain
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProviderConfig::default();
        assert_eq!(config.domain, "login.golingoapp.com");
        assert_eq!(config.response_type, "token id_token");
        assert_eq!(config.realm, "Username-Password-Authentication");
        assert_eq!(config.connection, "Username-Password-Authentication");
        assert_eq!(config.scope, "openid profile email");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_redirect_target_by_host() {
        assert_eq!(
            ProviderConfig::for_host("localhost").redirect_uri,
            "http://localhost:5173"
        );
        assert_eq!(
            ProviderConfig::for_host("vendor.golingoapp.com").redirect_uri,
            "https://vendor.golingoapp.com"
        );
        assert_eq!(redirect_uri_for_host("127.0.0.1"), PRODUCTION_REDIRECT_URI);
    }

    #[test]
    fn test_validate_rejects_blank_and_scheme() {
        let config = ProviderConfig {
            client_id: "  ".to_string(),
            ..ProviderConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = ProviderConfig {
            domain: "https://login.golingoapp.com".to_string(),
            ..ProviderConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: ProviderConfig =
            serde_json::from_str(r#"{"domain":"auth.example.test"}"#).unwrap();
        assert_eq!(config.domain, "auth.example.test");
        assert_eq!(config.client_id, DEFAULT_CLIENT_ID);
        assert_eq!(config.scope, DEFAULT_SCOPE);
    }
}
