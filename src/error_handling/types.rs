//! Error type definitions.
//!
//! This module defines all error types used throughout the application.

use log::SetLoggerError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Configuration problems detected at startup.
///
/// These are the only fatal errors in the service. The library never exits the
/// process itself; the binary decides how to react (it exits with status 1).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// One or more of the queue connection settings is absent or empty.
    ///
    /// Carries the environment variable names that were missing.
    #[error("Missing required Redis environment variables.")]
    MissingQueueSettings(Vec<&'static str>),

    /// The queue port is not a valid TCP port number.
    #[error("Invalid Redis port: {0}")]
    InvalidPort(String),

    /// No database URL was supplied.
    #[error("Missing required database URL (DATABASE_URL).")]
    MissingDatabaseUrl,

    /// The backlog threshold must be at least 1.
    #[error("Queue threshold must be greater than zero")]
    InvalidThreshold,

    /// The poll interval must be at least 1 ms.
    #[error("Poll interval must be greater than zero")]
    InvalidPollInterval,

    /// The drain batch size must be at least 1 and fit in one bulk statement.
    #[error(
        "Maximum batch size must be between 1 and {}",
        crate::config::MAX_BATCH_SIZE_LIMIT
    )]
    InvalidBatchSize,
}

/// Error types for queue backend operations.
#[derive(Error, Debug)]
pub enum QueueError {
    /// Redis command or connection error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// A job's data is absent or does not decode into a record.
    #[error("Invalid payload for job {id}: {reason}")]
    InvalidPayload {
        /// Id of the offending job.
        id: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// Error types for database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// A record's timestamp is not an ISO-8601 instant.
    #[error("Invalid timestamp {value:?} for record {id}")]
    InvalidTimestamp {
        /// Id of the offending record.
        id: String,
        /// The timestamp as received.
        value: String,
    },
}

/// Error types for a drain cycle (batch retrieval plus persistence).
#[derive(Error, Debug)]
pub enum DrainError {
    /// Retrieving, acknowledging or restoring jobs failed.
    #[error("Queue error during drain: {0}")]
    Queue(#[from] QueueError),

    /// Persisting the batch failed.
    #[error("Failed to persist batch: {0}")]
    Database(#[from] DatabaseError),
}
