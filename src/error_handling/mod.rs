//! Error handling.
//!
//! Errors are categorized by the layer that raises them:
//! - **Configuration**: fatal, reported once at startup
//! - **Queue**: backlog queries and job retrieval (recoverable at the monitor)
//! - **Database**: table setup and bulk upserts (surfaced to the drain caller)
//! - **Drain**: the union of the two above for one drain cycle

mod types;

// Re-export public API
pub use types::{ConfigError, DatabaseError, DrainError, InitializationError, QueueError};
