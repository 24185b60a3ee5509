//! Small shared utilities: job ids and timestamps.

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

/// A UTC timestamp.
pub type Timestamp = DateTime<Utc>;

/// Generates a fresh job identifier. Never reused.
#[must_use]
pub fn generate_job_id() -> Uuid {
    Uuid::new_v4()
}

/// Returns the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Returns the current UTC time as an ISO-8601 string with millisecond
/// precision.
#[must_use]
pub fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
