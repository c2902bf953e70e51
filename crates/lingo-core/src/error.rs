//! Error types for lingo-core.

use thiserror::Error;

/// Result type alias using lingo-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for session operations
#[derive(Error, Debug)]
pub enum Error {
    // Identity provider errors
    /// Interactive login or registration rejected; carries the provider's message only.
    #[error("{0}")]
    Auth(String),

    #[error("Session was logged out while the request was in flight")]
    Interrupted,

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    // Location / configuration errors
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Check if this error came from the identity provider
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}
