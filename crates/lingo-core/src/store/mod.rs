//! Persistent key-value storage scoped to one origin.
//!
//! The session manager is the only writer. Three keys make up the whole
//! durable contract:
//!
//! | key         | value                                   |
//! |-------------|-----------------------------------------|
//! | `idToken`   | opaque bearer credential                |
//! | `expiresAt` | JSON integer, epoch milliseconds        |
//! | `userEmail` | optional, only when the provider sent it |
//!
//! `authTransaction` sits beside them while a hosted login is pending.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;

/// Key holding the id token
pub const ID_TOKEN_KEY: &str = "idToken";

/// Key holding the local expiry (epoch ms, JSON-encoded)
pub const EXPIRES_AT_KEY: &str = "expiresAt";

/// Key holding the signed-in user's email
pub const USER_EMAIL_KEY: &str = "userEmail";

/// Key holding the pending hosted-login `state`/`nonce` (JSON)
pub const AUTH_TRANSACTION_KEY: &str = "authTransaction";

/// All keys owned by a session, cleared together.
pub const SESSION_KEYS: [&str; 3] = [ID_TOKEN_KEY, EXPIRES_AT_KEY, USER_EMAIL_KEY];

/// Synchronous key-value store.
///
/// Missing keys are not errors: `get` returns `Ok(None)` and `remove` is a
/// no-op. `Err` is reserved for the backing medium failing.
pub trait PersistentStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value.
    fn remove(&self, key: &str) -> Result<()>;
}
