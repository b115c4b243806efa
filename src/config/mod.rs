//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (defaults, queue key layout, retry policy)
//! - CLI option types and parsing
//! - The validated library configuration

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{validate_max_batch_size, Config, LogFormat, LogLevel, Opt, QueueSettings};
