//! Queue backend access.
//!
//! Two traits describe what the service needs from the queue:
//! - [`BacklogSource`]: how many jobs are waiting (polled by the monitor)
//! - [`JobSource`]: claim a batch of waiting jobs and settle them afterwards
//!   (used by the drainer)
//!
//! [`RedisQueue`] implements both on top of the Redis key layout written by
//! Bull producers (`bull:<queue>:wait`, `bull:<queue>:<job id>`, ...).

mod keys;
mod redis_queue;

use async_trait::async_trait;

use crate::error_handling::QueueError;

pub use self::keys::QueueKeys;
pub use self::redis_queue::RedisQueue;

/// Reports the current backlog of a queue.
#[async_trait]
pub trait BacklogSource: Send + Sync {
    /// Number of jobs waiting to be processed.
    async fn backlog_count(&self) -> Result<u64, QueueError>;
}

/// A job claimed from the wait list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedJob {
    /// Job id within the queue
    pub id: String,
    /// Raw JSON payload, `None` when the job hash has no data
    pub data: Option<String>,
}

/// Claims waiting jobs and settles them once their fate is known.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Removes up to `max` of the oldest waiting jobs and returns them, oldest first.
    async fn take_batch(&self, max: usize) -> Result<Vec<QueuedJob>, QueueError>;

    /// Forgets jobs whose records were persisted.
    async fn acknowledge(&self, ids: &[String]) -> Result<(), QueueError>;

    /// Puts claimed jobs back at the head of the wait list, keeping their order.
    async fn restore(&self, ids: &[String]) -> Result<(), QueueError>;

    /// Moves a job whose payload cannot be processed to the failed set.
    async fn reject(&self, id: &str, reason: &str) -> Result<(), QueueError>;
}
