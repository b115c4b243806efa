// storage/models.rs
// Database models and types

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error_handling::DatabaseError;

/// Wall-clock format stored in the `timestamp` column.
const STORAGE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Naive date-time layouts accepted when the input carries no zone designator.
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// One queued message, as produced onto the queue and stored in `messages`.
///
/// # Database Schema
///
/// This struct maps directly to the `messages` table: `id` is stored in the
/// `msg_id` primary key column, `owner_id` in `user_id`. The `timestamp` is
/// kept as received and only normalized when a row is built for insertion.
///
/// The serde names follow the job payload produced onto the queue
/// (`msg_id`, `message`, `user_id`, `timestamp`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueRecord {
    /// Unique message id (primary key)
    #[serde(rename = "msg_id", alias = "id")]
    pub id: String,
    /// Message body
    pub message: String,
    /// Id of the user who produced the message
    #[serde(rename = "user_id", alias = "owner_id", alias = "ownerId")]
    pub owner_id: String,
    /// ISO-8601 instant as received
    pub timestamp: String,
}

impl QueueRecord {
    /// Builds a record from its four fields.
    pub fn new(
        id: impl Into<String>,
        message: impl Into<String>,
        owner_id: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        QueueRecord {
            id: id.into(),
            message: message.into(),
            owner_id: owner_id.into(),
            timestamp: timestamp.into(),
        }
    }

    /// Returns the timestamp rendered as `YYYY-MM-DD HH:MM:SS` in UTC.
    pub fn normalized_timestamp(&self) -> Result<String, DatabaseError> {
        normalize_timestamp(&self.timestamp).ok_or_else(|| DatabaseError::InvalidTimestamp {
            id: self.id.clone(),
            value: self.timestamp.clone(),
        })
    }

    /// Builds the bound parameter row `[msg_id, message, user_id, timestamp]`.
    pub(crate) fn to_row(&self) -> Result<Vec<String>, DatabaseError> {
        Ok(vec![
            self.id.clone(),
            self.message.clone(),
            self.owner_id.clone(),
            self.normalized_timestamp()?,
        ])
    }
}

/// Normalizes an ISO-8601 instant to second-precision UTC wall-clock time.
///
/// Instants with an offset are converted to UTC; fractional seconds are
/// truncated. Date-times without a zone designator and bare dates are taken
/// as UTC. Returns `None` when the input is not a recognizable instant.
pub fn normalize_timestamp(value: &str) -> Option<String> {
    let value = value.trim();

    let instant = DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc).naive_utc())
        .ok()
        .or_else(|| {
            NAIVE_TIMESTAMP_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;

    Some(instant.format(STORAGE_TIMESTAMP_FORMAT).to_string())
}
