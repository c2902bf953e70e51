//! Client-side session management.
//!
//! ## Lifecycle
//!
//! ```text
//! Process Start
//!   │
//!   ├─► initialize(): redirect fragment → stored session → signed out
//!   │
//!   └─► loading = false, views notified
//!
//! Interactive
//!   │
//!   ├─► login():    provider round trip → commit (24h local TTL)
//!   ├─► register(): provider round trip → no session
//!   └─► logout():   clear store + state
//! ```
//!
//! The [`SessionManager`] is the only writer of both the in-memory record
//! and the persisted keys; everything else observes through a
//! [`SessionView`].

mod manager;
mod view;

pub use manager::SessionManager;
pub use view::{SessionRecord, SessionView};
