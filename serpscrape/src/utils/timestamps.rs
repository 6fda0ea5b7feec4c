//! Timestamp formatting.

use chrono::Utc;

/// Returns the current UTC time in ISO-8601 form with microseconds.
#[must_use]
pub fn iso_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
}
