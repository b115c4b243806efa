//! Configuration constants.
//!
//! Defaults for the monitor cadence, queue naming, database pool sizing and the
//! startup connection retry policy.

// Monitor defaults
/// Backlog size at which a drain is triggered
pub const DEFAULT_QUEUE_THRESHOLD: u64 = 1000;
/// Milliseconds between two backlog polls
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;
/// Upper bound on the number of jobs pulled by one drain
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;
/// Largest accepted batch size
/// A drain is one statement with 4 placeholders per row; MySQL allows 65,535 placeholders
pub const MAX_BATCH_SIZE_LIMIT: usize =
    u16::MAX as usize / crate::storage::statements::MESSAGE_COLUMN_COUNT;

// Queue layout
/// Name of the queue the producers write to
pub const DEFAULT_QUEUE_NAME: &str = "dataQueue";
/// Key prefix used by Bull-compatible producers
pub const QUEUE_KEY_PREFIX: &str = "bull";

// Database
/// Maximum connections held by the database pool
/// One persist borrows exactly one connection, so a small pool is enough
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

// Environment variable names (also used in configuration error reports)
/// Queue host
pub const ENV_REDIS_HOST: &str = "REDIS_HOST";
/// Queue port
pub const ENV_REDIS_PORT: &str = "REDIS_PORT";
/// Queue credential
pub const ENV_REDIS_PASSWORD: &str = "REDIS_PASSWORD";

// Startup retry strategy (connecting to Redis and the database only)
/// Initial delay in milliseconds before first retry
pub const RETRY_INITIAL_DELAY_MS: u64 = 500;
/// Factor by which retry delay is multiplied on each attempt
pub const RETRY_FACTOR: u64 = 2;
/// Maximum delay between retries in seconds
pub const RETRY_MAX_DELAY_SECS: u64 = 10;
/// Maximum number of retries after the first attempt
pub const RETRY_MAX_ATTEMPTS: usize = 5;
