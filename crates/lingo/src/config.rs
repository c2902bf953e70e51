//! Configuration management for lingo.
//!
//! Configuration is loaded from multiple sources with precedence:
//! 1. Environment variables (LINGO_*)
//! 2. Config file (LINGO_CONFIG or <data dir>/config.toml)
//! 3. Default values

use anyhow::{Context, Result};
use directories::ProjectDirs;
use lingo_core::config::ProviderConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Identity provider overrides
    #[serde(default)]
    pub provider: ProviderSection,

    /// The page the session lives on
    #[serde(default)]
    pub page: PageConfig,

    /// Where sessions are persisted
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Overrides on top of the built-in provider settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderSection {
    /// Provider domain
    pub domain: Option<String>,

    /// Client identifier
    pub client_id: Option<String>,

    /// Redirect target; derived from the page host when unset
    pub redirect_uri: Option<String>,

    /// Talk to this server instead of https://<domain> (staging, mocks)
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    /// Page URL; its origin scopes the stored session
    #[serde(default = "default_page_url")]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one session file per origin
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

// Default value functions
fn default_page_url() -> String {
    "http://localhost:5173/".to_string()
}

fn default_data_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "golingoapp", "lingo") {
        proj_dirs.data_dir().to_path_buf()
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".lingo")
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            url: default_page_url(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")?
        } else {
            Config::default()
        };

        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Apply `LINGO_*` overrides looked up through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(domain) = lookup("LINGO_AUTH_DOMAIN") {
            self.provider.domain = Some(domain);
        }
        if let Some(client_id) = lookup("LINGO_CLIENT_ID") {
            self.provider.client_id = Some(client_id);
        }
        if let Some(base_url) = lookup("LINGO_AUTH_BASE_URL") {
            self.provider.base_url = Some(base_url);
        }
        if let Some(url) = lookup("LINGO_PAGE_URL") {
            self.page.url = url;
        }
        if let Some(dir) = lookup("LINGO_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
    }

    /// Get the config file path.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("LINGO_CONFIG") {
            PathBuf::from(path)
        } else {
            default_data_dir().join("config.toml")
        }
    }

    /// Provider settings for a page served from `host`.
    pub fn provider_config(&self, host: &str) -> ProviderConfig {
        let mut config = ProviderConfig::for_host(host);
        if let Some(domain) = &self.provider.domain {
            config.domain = domain.clone();
        }
        if let Some(client_id) = &self.provider.client_id {
            config.client_id = client_id.clone();
        }
        if let Some(redirect_uri) = &self.provider.redirect_uri {
            config.redirect_uri = redirect_uri.clone();
        }
        config
    }

    /// Ensure the storage directory exists.
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.storage.data_dir)
            .context("Failed to create data directory")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.page.url, "http://localhost:5173/");
        assert!(config.provider.domain.is_none());
        assert!(config.provider.base_url.is_none());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [provider]
            domain = "auth.staging.golingoapp.com"

            [page]
            url = "https://vendor.golingoapp.com/"
            "#,
        )
        .expect("Failed to parse config");

        assert_eq!(config.provider.domain.as_deref(), Some("auth.staging.golingoapp.com"));
        assert_eq!(config.page.url, "https://vendor.golingoapp.com/");
        assert_eq!(config.storage.data_dir, default_data_dir());
    }

    #[test]
    fn test_env_overrides_win() {
        let env: HashMap<&str, &str> = [
            ("LINGO_AUTH_DOMAIN", "env.example.test"),
            ("LINGO_PAGE_URL", "http://localhost:4000/"),
            ("LINGO_DATA_DIR", "/tmp/lingo-test"),
            ("LINGO_CLIENT_ID", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.provider.client_id = Some("from-file".to_string());
        config.apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.provider.domain.as_deref(), Some("env.example.test"));
        assert_eq!(config.provider.client_id.as_deref(), Some("from-file"));
        assert_eq!(config.page.url, "http://localhost:4000/");
        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/lingo-test"));
    }

    #[test]
    fn test_provider_config_by_host() {
        let config = Config::default();
        assert_eq!(
            config.provider_config("localhost").redirect_uri,
            "http://localhost:5173"
        );
        assert_eq!(
            config.provider_config("vendor.golingoapp.com").redirect_uri,
            "https://vendor.golingoapp.com"
        );

        let mut config = Config::default();
        config.provider.redirect_uri = Some("http://localhost:4000".to_string());
        config.provider.domain = Some("auth.example.test".to_string());
        let provider = config.provider_config("localhost");
        assert_eq!(provider.redirect_uri, "http://localhost:4000");
        assert_eq!(provider.domain, "auth.example.test");
        assert_eq!(provider.scope, "openid profile email");
    }

    #[test]
    fn test_ensure_dirs_creates_directory() {
        let temp = tempdir().expect("Failed to create temp dir");
        let config = Config {
            storage: StorageConfig {
                data_dir: temp.path().join("sessions"),
            },
            ..Config::default()
        };

        assert!(!config.storage.data_dir.exists());
        config.ensure_dirs().expect("Failed to create directories");
        assert!(config.storage.data_dir.exists());
    }
}
