//! Item store: users, items, saved outfits and feedback
//!
//! Runtime `sqlx` queries against the schema created by
//! `closet_common::db::create_schema`. Timestamps are stored as RFC 3339 text.

pub mod items;
pub mod outfits;
pub mod users;

use chrono::{DateTime, Utc};
use closet_common::{Error, Result};

/// Parse a stored RFC 3339 timestamp
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Bad timestamp '{}': {}", raw, e)))
}

/// Current time in the stored format
pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339()
}
