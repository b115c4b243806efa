//! queue_batcher library: threshold-triggered queue draining
//!
//! This library watches the backlog of a Redis job queue (Bull key layout) and,
//! once the number of waiting jobs reaches a threshold, drains a batch of them
//! into a relational table with a single idempotent bulk upsert.
//!
//! # Example
//!
//! ```no_run
//! use clap::Parser;
//! use queue_batcher::{run_monitor, Config, Opt};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::try_from(Opt::parse())?;
//!
//! // Runs until Ctrl-C
//! let report = run_monitor(config).await?;
//! println!("{} drains, {} records persisted", report.drains, report.persisted_records);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

#![warn(missing_docs)]

pub mod config;
pub mod drain;
mod error_handling;
pub mod initialization;
pub mod monitor;
pub mod queue;
pub mod storage;
#[cfg(test)]
mod test_helpers;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel, Opt, QueueSettings};
pub use drain::{Drain, QueueDrainer};
pub use error_handling::{ConfigError, DatabaseError, DrainError, InitializationError, QueueError};
pub use monitor::{
    Decision, MonitorHandle, MonitorSettings, MonitorState, MonitorStats, QueueMonitor,
    TickOutcome,
};
pub use queue::{BacklogSource, JobSource, QueuedJob, RedisQueue};
pub use run::{run_monitor, MonitorReport};
pub use storage::{BatchPersister, ConnectionPool, QueueRecord, StoreConnection};

// Internal run module (wires the service together)
mod run {
    use std::sync::Arc;

    use anyhow::{Context, Result};
    use log::{info, warn};

    use crate::config::Config;
    use crate::drain::QueueDrainer;
    use crate::initialization::{connect_queue, connect_store};
    use crate::monitor::{MonitorEvent, QueueMonitor};
    use crate::storage::BatchPersister;

    /// Summary of a monitor run, produced on shutdown.
    #[derive(Debug, Clone)]
    pub struct MonitorReport {
        /// Ticks executed
        pub ticks: usize,
        /// Drains that completed
        pub drains: usize,
        /// Drains that returned an error
        pub drain_failures: usize,
        /// Backlog queries that failed
        pub poll_failures: usize,
        /// Records persisted over the whole run
        pub persisted_records: usize,
        /// Elapsed time in seconds
        pub elapsed_seconds: f64,
    }

    /// Runs the queue monitor until Ctrl-C.
    ///
    /// Connects to Redis and the database (retrying while they come up), starts
    /// the monitor, and on shutdown waits for any in-flight drain before
    /// closing the pool.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - Redis stays unreachable after the startup retries
    /// - The database stays unreachable after the startup retries
    /// - The configuration is rejected by the monitor or the drainer
    pub async fn run_monitor(config: Config) -> Result<MonitorReport> {
        let queue = Arc::new(
            connect_queue(&config.queue)
                .await
                .context("Failed to connect to Redis")?,
        );
        let pool = Arc::new(
            connect_store(&config.database_url, config.db_max_connections)
                .await
                .context("Failed to initialize database pool")?,
        );

        let persister = BatchPersister::new(Arc::clone(&pool));
        let drainer = Arc::new(QueueDrainer::new(
            Arc::clone(&queue),
            persister,
            config.max_batch_size,
        )?);
        let monitor = QueueMonitor::new(config.monitor.clone(), queue, drainer)?;

        let start_time = std::time::Instant::now();
        let handle = monitor.start();

        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Shutdown requested, waiting for the current tick to finish");

        let stats = handle.stop().await;
        pool.close().await;
        stats.log_summary();

        Ok(MonitorReport {
            ticks: stats.count(MonitorEvent::Tick),
            drains: stats.count(MonitorEvent::Drain),
            drain_failures: stats.count(MonitorEvent::DrainFailure),
            poll_failures: stats.count(MonitorEvent::PollFailure),
            persisted_records: stats.persisted_records(),
            elapsed_seconds: start_time.elapsed().as_secs_f64(),
        })
    }
}
