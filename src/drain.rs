//! Drain collaborator: moves a batch of jobs from the queue into storage.
//!
//! A drain claims up to `min(waiting, max_batch_size)` of the oldest waiting
//! jobs, decodes their payloads, and hands the valid records to the
//! [`BatchPersister`] in one call. Claimed jobs are settled according to the
//! outcome:
//! - persisted: acknowledged (job hashes deleted); an acknowledge failure is
//!   only logged since the records are already stored
//! - persist failed: restored to the head of the wait list
//! - undecodable payload or timestamp: rejected to the failed set

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, warn};

use crate::config::validate_max_batch_size;
use crate::error_handling::{ConfigError, DrainError, QueueError};
use crate::queue::{JobSource, QueuedJob};
use crate::storage::{BatchPersister, ConnectionPool, QueueRecord};

/// Something the monitor can invoke when the backlog crosses the threshold.
#[async_trait]
pub trait Drain: Send + Sync {
    /// Drains the queue given the observed backlog and returns the number of
    /// records persisted.
    async fn drain(&self, waiting: u64) -> Result<usize, DrainError>;
}

/// Production drain over a [`JobSource`] and a [`BatchPersister`].
pub struct QueueDrainer<J: JobSource, P: ConnectionPool> {
    jobs: Arc<J>,
    persister: BatchPersister<P>,
    max_batch_size: usize,
}

impl<J: JobSource, P: ConnectionPool> QueueDrainer<J, P> {
    /// Creates a drainer that claims at most `max_batch_size` jobs per drain.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBatchSize` when `max_batch_size` is zero or
    /// too large for a single bulk statement.
    pub fn new(
        jobs: Arc<J>,
        persister: BatchPersister<P>,
        max_batch_size: usize,
    ) -> Result<Self, ConfigError> {
        validate_max_batch_size(max_batch_size)?;
        Ok(QueueDrainer {
            jobs,
            persister,
            max_batch_size,
        })
    }

    /// Splits claimed jobs into decodable records and rejects the rest.
    async fn decode(&self, jobs: Vec<QueuedJob>) -> (Vec<QueueRecord>, Vec<String>) {
        let mut records = Vec::with_capacity(jobs.len());
        let mut ids = Vec::with_capacity(jobs.len());

        for job in jobs {
            match decode_job(&job) {
                Ok(record) => {
                    records.push(record);
                    ids.push(job.id);
                }
                Err(e) => {
                    warn!("Rejecting job: {}", e);
                    let reason = e.to_string();
                    if let Err(e) = self.jobs.reject(&job.id, &reason).await {
                        error!("Failed to move job {} to the failed set: {}", job.id, e);
                    }
                }
            }
        }

        (records, ids)
    }
}

fn decode_job(job: &QueuedJob) -> Result<QueueRecord, QueueError> {
    let invalid = |reason: String| QueueError::InvalidPayload {
        id: job.id.clone(),
        reason,
    };

    let data = job
        .data
        .as_deref()
        .ok_or_else(|| invalid("job has no data".to_string()))?;
    let record: QueueRecord = serde_json::from_str(data).map_err(|e| invalid(e.to_string()))?;
    record
        .normalized_timestamp()
        .map_err(|e| invalid(e.to_string()))?;
    Ok(record)
}

#[async_trait]
impl<J, P> Drain for QueueDrainer<J, P>
where
    J: JobSource + 'static,
    P: ConnectionPool + 'static,
{
    async fn drain(&self, waiting: u64) -> Result<usize, DrainError> {
        let limit = usize::try_from(waiting)
            .unwrap_or(usize::MAX)
            .min(self.max_batch_size);

        let jobs = self.jobs.take_batch(limit).await?;
        if jobs.is_empty() {
            debug!("No jobs left to drain");
            return Ok(0);
        }

        let (records, ids) = self.decode(jobs).await;
        if records.is_empty() {
            return Ok(0);
        }

        match self.persister.persist(&records).await {
            Ok(count) => {
                if let Err(e) = self.jobs.acknowledge(&ids).await {
                    warn!("Failed to acknowledge {} persisted jobs: {}", ids.len(), e);
                }
                Ok(count)
            }
            Err(e) => {
                if let Err(restore_err) = self.jobs.restore(&ids).await {
                    error!(
                        "Failed to restore {} jobs after persist failure: {}",
                        ids.len(),
                        restore_err
                    );
                }
                Err(e.into())
            }
        }
    }
}
