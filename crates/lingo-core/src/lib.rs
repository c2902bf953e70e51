//! lingo-core - Core library for the GoLingo vendor portal
//!
//! This crate provides the session plumbing shared by every front end:
//!
//! - **session**: Session state machine and read-only session view
//! - **provider**: Identity provider client (redirect parsing, login, signup)
//! - **store**: Origin-scoped persistent key-value storage
//! - **location**: Page URL access (redirect fragment, host detection)
//! - **config**: Identity provider configuration
//! - **subtitles**: SRT parsing and serialization
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lingo_core::config::ProviderConfig;
//! use lingo_core::location::{Location, PageLocation};
//! use lingo_core::provider::Auth0Client;
//! use lingo_core::session::SessionManager;
//! use lingo_core::store::MemoryStore;
//!
//! async fn example() -> lingo_core::Result<()> {
//!     let location = Arc::new(PageLocation::parse("http://localhost:5173/")?);
//!     let config = ProviderConfig::for_host(&location.hostname());
//!     let store = Arc::new(MemoryStore::new());
//!     let provider = Arc::new(Auth0Client::new(config.clone())?.with_transaction_store(store.clone()));
//!
//!     let manager = SessionManager::new(provider, store, location, config);
//!     manager.initialize().await;
//!
//!     let view = manager.view();
//!     println!("signed in: {}", view.is_authenticated());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod location;
pub mod provider;
pub mod session;
pub mod store;
pub mod subtitles;
pub mod time;

// Re-export commonly used types
pub use error::{Error, Result};
pub use session::{SessionManager, SessionRecord, SessionView};
