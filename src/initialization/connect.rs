//! Startup connections to the queue and the database.
//!
//! Both backends are retried with exponential backoff so the service can be
//! started alongside them (e.g. in the same compose file). Once running, the
//! monitor never retries on its own; a failed tick simply waits for the next one.

use std::future::Future;
use std::time::Duration;

use log::warn;
use sqlx::AnyPool;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::Retry;

use crate::config::{
    QueueSettings, RETRY_FACTOR, RETRY_INITIAL_DELAY_MS, RETRY_MAX_ATTEMPTS, RETRY_MAX_DELAY_SECS,
};
use crate::error_handling::{DatabaseError, QueueError};
use crate::queue::RedisQueue;
use crate::storage::init_db_pool;

/// Delays between startup connection attempts.
pub fn startup_retry_strategy() -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(RETRY_INITIAL_DELAY_MS)
        .factor(RETRY_FACTOR)
        .max_delay(Duration::from_secs(RETRY_MAX_DELAY_SECS))
        .take(RETRY_MAX_ATTEMPTS)
}

async fn with_retry<T, E, F, Fut>(what: &str, mut attempt: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    Retry::spawn(startup_retry_strategy(), || {
        let fut = attempt();
        async move {
            fut.await.map_err(|e| {
                warn!("Connecting to {} failed: {}", what, e);
                e
            })
        }
    })
    .await
}

/// Connects to the queue, retrying transient failures.
pub async fn connect_queue(settings: &QueueSettings) -> Result<RedisQueue, QueueError> {
    with_retry("Redis", || RedisQueue::connect(settings)).await
}

/// Opens the database pool, retrying transient failures.
pub async fn connect_store(database_url: &str, max_connections: u32) -> Result<AnyPool, DatabaseError> {
    with_retry("the database", || init_db_pool(database_url, max_connections)).await
}
