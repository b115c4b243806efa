//! Redis-backed queue client.

use std::num::NonZeroUsize;

use async_trait::async_trait;
use log::{debug, error, info};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, IntoConnectionInfo};

use super::{BacklogSource, JobSource, QueueKeys, QueuedJob};
use crate::config::QueueSettings;
use crate::error_handling::QueueError;

/// Field of the job hash holding the JSON payload.
const JOB_DATA_FIELD: &str = "data";
/// Field of the job hash recording why a job was rejected.
const JOB_FAILED_REASON_FIELD: &str = "failedReason";

/// Queue client over a multiplexed, auto-reconnecting Redis connection.
///
/// Producers push job ids on the left of the wait list, so the oldest jobs sit
/// at the right end; batches are claimed from there.
#[derive(Clone)]
pub struct RedisQueue {
    connection: ConnectionManager,
    keys: QueueKeys,
}

impl RedisQueue {
    /// Connects to the Redis server described by `settings`.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Redis` if the server is unreachable or rejects the
    /// credentials.
    pub async fn connect(settings: &QueueSettings) -> Result<Self, QueueError> {
        let mut connection_info = (settings.host.clone(), settings.port).into_connection_info()?;
        connection_info.redis.password = Some(settings.password.clone());

        let client = Client::open(connection_info)?;
        let connection = client.get_connection_manager().await?;
        info!(
            "Connected to Redis at {}:{} (queue '{}')",
            settings.host, settings.port, settings.queue_name
        );

        Ok(RedisQueue {
            connection,
            keys: QueueKeys::new(&settings.queue_name),
        })
    }
}

#[async_trait]
impl BacklogSource for RedisQueue {
    async fn backlog_count(&self) -> Result<u64, QueueError> {
        let mut connection = self.connection.clone();
        let waiting: u64 = connection.llen(self.keys.wait()).await?;
        Ok(waiting)
    }
}

#[async_trait]
impl JobSource for RedisQueue {
    async fn take_batch(&self, max: usize) -> Result<Vec<QueuedJob>, QueueError> {
        let Some(count) = NonZeroUsize::new(max) else {
            return Ok(Vec::new());
        };

        let mut connection = self.connection.clone();
        let ids: Vec<String> = connection.rpop(self.keys.wait(), Some(count)).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for id in &ids {
            pipe.hget(self.keys.job(id), JOB_DATA_FIELD);
        }
        let data: Vec<Option<String>> = match pipe.query_async(&mut connection).await {
            Ok(data) => data,
            Err(e) => {
                // The ids are already off the wait list; hand them back before failing.
                if let Err(restore_err) = self.restore(&ids).await {
                    error!(
                        "Failed to put back {} claimed jobs on {}: {}",
                        ids.len(),
                        self.keys.wait(),
                        restore_err
                    );
                }
                return Err(e.into());
            }
        };

        let jobs = pair_jobs(ids, data);
        debug!("Claimed {} jobs from {}", jobs.len(), self.keys.wait());
        Ok(jobs)
    }

    async fn acknowledge(&self, ids: &[String]) -> Result<(), QueueError> {
        if ids.is_empty() {
            return Ok(());
        }
        let job_keys: Vec<String> = ids.iter().map(|id| self.keys.job(id)).collect();
        let mut connection = self.connection.clone();
        let _: () = connection.del(job_keys).await?;
        Ok(())
    }

    async fn restore(&self, ids: &[String]) -> Result<(), QueueError> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut connection = self.connection.clone();
        let _: () = connection
            .rpush(self.keys.wait(), restore_order(ids))
            .await?;
        debug!("Restored {} jobs to {}", ids.len(), self.keys.wait());
        Ok(())
    }

    async fn reject(&self, id: &str, reason: &str) -> Result<(), QueueError> {
        let mut connection = self.connection.clone();
        let failed_at = chrono::Utc::now().timestamp_millis();
        let _: () = connection
            .hset(self.keys.job(id), JOB_FAILED_REASON_FIELD, reason)
            .await?;
        let _: () = connection.zadd(self.keys.failed(), id, failed_at).await?;
        Ok(())
    }
}

/// Order in which claimed ids are RPUSHed back onto the wait list.
///
/// `ids` is oldest first. RPUSH appends left to right, so the newest goes in
/// first and the oldest ends up at the right end, where it is claimed next.
fn restore_order(ids: &[String]) -> Vec<String> {
    ids.iter().rev().cloned().collect()
}

/// Zips claimed ids with their `data` fields; a missing reply counts as no data.
fn pair_jobs(ids: Vec<String>, data: Vec<Option<String>>) -> Vec<QueuedJob> {
    let mut data = data.into_iter();
    ids.into_iter()
        .map(|id| QueuedJob {
            id,
            data: data.next().flatten(),
        })
        .collect()
}
