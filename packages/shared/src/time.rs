//! Wall-clock helpers for connection metadata.
//!
//! Chitty-Chat orders events with Lamport clocks only; these helpers exist
//! for the `connected_at` field reported by the inspection API.

use chrono::{DateTime, Utc};

/// Current Unix timestamp in milliseconds (UTC).
pub fn unix_timestamp_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert a Unix timestamp in milliseconds to RFC 3339 (UTC).
pub fn timestamp_to_rfc3339(timestamp_millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_millis)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}
