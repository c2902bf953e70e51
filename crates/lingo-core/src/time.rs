//! Time utilities

use chrono::{DateTime, TimeZone, Utc};

/// Lifetime of an accepted session, in milliseconds (24 hours).
pub const SESSION_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Current time as epoch milliseconds
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert epoch milliseconds to a UTC datetime
pub fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}
