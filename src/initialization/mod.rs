//! Application initialization and resource setup.
//!
//! This module provides functions to initialize shared resources:
//! - Logger
//! - Queue connection
//! - Database connection pool

mod connect;
mod logger;

pub use connect::{connect_queue, connect_store, startup_retry_strategy};
pub use logger::init_logger_with;
