//! Timestamp helpers.

use chrono::{DateTime, Utc};

/// A UTC timestamp as recorded on results.
pub type Timestamp = DateTime<Utc>;

/// Returns the current UTC timestamp.
#[must_use]
pub fn now_utc() -> Timestamp {
    Utc::now()
}
