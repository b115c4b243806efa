//! Shared test doubles for the queue, storage and drain seams.
//!
//! Each double records what it was asked to do so tests can assert on the
//! exact statements, parameters and call counts.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::drain::Drain;
use crate::error_handling::{DatabaseError, DrainError, QueueError};
use crate::queue::{BacklogSource, JobSource, QueuedJob};
use crate::storage::{ConnectionPool, Dialect, QueueRecord, StoreConnection, CREATE_MESSAGES_TABLE};

/// The two-record batch used throughout the persistence tests.
pub fn two_message_batch() -> Vec<QueueRecord> {
    vec![
        QueueRecord::new("1", "Hello, world!", "user1", "2023-04-01T12:00:00Z"),
        QueueRecord::new("2", "Goodbye, world!", "user2", "2023-04-02T12:00:00Z"),
    ]
}

/// Builds a queued job whose payload is a valid record.
pub fn job(id: &str, message: &str, timestamp: &str) -> QueuedJob {
    let record = QueueRecord::new(id, message, format!("user-{id}"), timestamp);
    QueuedJob {
        id: id.to_string(),
        data: Some(serde_json::to_string(&record).expect("record serializes")),
    }
}

pub fn redis_error(message: &'static str) -> QueueError {
    QueueError::from(redis::RedisError::from((
        redis::ErrorKind::IoError,
        message,
    )))
}

/// Everything a [`RecordingPool`] observed.
#[derive(Debug, Default, Clone)]
pub struct StoreLog {
    pub acquired: usize,
    pub released: usize,
    pub queries: Vec<(String, Vec<Vec<String>>)>,
}

/// In-memory pool that records statements instead of executing them.
pub struct RecordingPool {
    dialect: Dialect,
    fail_acquire: bool,
    fail_table_setup: bool,
    fail_upsert: bool,
    log: Arc<Mutex<StoreLog>>,
}

impl RecordingPool {
    pub fn new(dialect: Dialect) -> Self {
        RecordingPool {
            dialect,
            fail_acquire: false,
            fail_table_setup: false,
            fail_upsert: false,
            log: Arc::new(Mutex::new(StoreLog::default())),
        }
    }

    pub fn failing_acquire(mut self) -> Self {
        self.fail_acquire = true;
        self
    }

    pub fn failing_table_setup(mut self) -> Self {
        self.fail_table_setup = true;
        self
    }

    pub fn failing_upsert(mut self) -> Self {
        self.fail_upsert = true;
        self
    }

    pub fn log(&self) -> StoreLog {
        self.log.lock().unwrap().clone()
    }
}

pub struct RecordingConnection {
    dialect: Dialect,
    fail_table_setup: bool,
    fail_upsert: bool,
    log: Arc<Mutex<StoreLog>>,
}

#[async_trait]
impl ConnectionPool for RecordingPool {
    type Connection = RecordingConnection;

    async fn acquire(&self) -> Result<Self::Connection, DatabaseError> {
        if self.fail_acquire {
            return Err(DatabaseError::SqlError(sqlx::Error::PoolTimedOut));
        }
        self.log.lock().unwrap().acquired += 1;
        Ok(RecordingConnection {
            dialect: self.dialect,
            fail_table_setup: self.fail_table_setup,
            fail_upsert: self.fail_upsert,
            log: Arc::clone(&self.log),
        })
    }
}

#[async_trait]
impl StoreConnection for RecordingConnection {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn query(&mut self, sql: &str, rows: &[Vec<String>]) -> Result<u64, DatabaseError> {
        self.log
            .lock()
            .unwrap()
            .queries
            .push((sql.to_string(), rows.to_vec()));

        let is_table_setup = sql == CREATE_MESSAGES_TABLE;
        if (is_table_setup && self.fail_table_setup) || (!is_table_setup && self.fail_upsert) {
            return Err(DatabaseError::SqlError(sqlx::Error::Protocol(
                "simulated backend failure".to_string(),
            )));
        }
        Ok(rows.len() as u64)
    }

    fn release(self) {
        self.log.lock().unwrap().released += 1;
    }
}

/// Backlog source replaying a scripted sequence of answers.
///
/// Once the script is exhausted it keeps answering with an empty backlog.
#[derive(Default)]
pub struct ScriptedBacklog {
    responses: Mutex<VecDeque<Result<u64, QueueError>>>,
    calls: AtomicUsize,
}

impl ScriptedBacklog {
    pub fn new(responses: Vec<Result<u64, QueueError>>) -> Self {
        ScriptedBacklog {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BacklogSource for ScriptedBacklog {
    async fn backlog_count(&self) -> Result<u64, QueueError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses.lock().unwrap().pop_front().unwrap_or(Ok(0))
    }
}

/// Drain that records the backlog it was invoked with.
#[derive(Default)]
pub struct RecordingDrain {
    fail: bool,
    calls: Mutex<Vec<u64>>,
}

impl RecordingDrain {
    pub fn failing() -> Self {
        RecordingDrain {
            fail: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<u64> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Drain for RecordingDrain {
    async fn drain(&self, waiting: u64) -> Result<usize, DrainError> {
        self.calls.lock().unwrap().push(waiting);
        if self.fail {
            return Err(DrainError::Database(DatabaseError::SqlError(
                sqlx::Error::PoolTimedOut,
            )));
        }
        Ok(waiting as usize)
    }
}

/// In-memory job source mirroring the wait-list semantics of the Redis queue.
///
/// `wait` holds the oldest job at the front.
#[derive(Default)]
pub struct MemoryJobs {
    fail_acknowledge: bool,
    wait: Mutex<VecDeque<QueuedJob>>,
    claimed: Mutex<Vec<QueuedJob>>,
    acknowledged: Mutex<Vec<String>>,
    restored: Mutex<Vec<String>>,
    rejected: Mutex<Vec<String>>,
}

impl MemoryJobs {
    pub fn with_jobs(jobs: Vec<QueuedJob>) -> Self {
        MemoryJobs {
            wait: Mutex::new(jobs.into()),
            ..Default::default()
        }
    }

    pub fn failing_acknowledge(mut self) -> Self {
        self.fail_acknowledge = true;
        self
    }

    pub fn waiting(&self) -> usize {
        self.wait.lock().unwrap().len()
    }

    pub fn acknowledged(&self) -> Vec<String> {
        self.acknowledged.lock().unwrap().clone()
    }

    pub fn restored(&self) -> Vec<String> {
        self.restored.lock().unwrap().clone()
    }

    pub fn rejected(&self) -> Vec<String> {
        self.rejected.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobSource for MemoryJobs {
    async fn take_batch(&self, max: usize) -> Result<Vec<QueuedJob>, QueueError> {
        let mut wait = self.wait.lock().unwrap();
        let count = max.min(wait.len());
        let jobs: Vec<QueuedJob> = wait.drain(..count).collect();
        self.claimed.lock().unwrap().extend(jobs.iter().cloned());
        Ok(jobs)
    }

    async fn acknowledge(&self, ids: &[String]) -> Result<(), QueueError> {
        if self.fail_acknowledge {
            return Err(redis_error("Redis connection failed"));
        }
        self.acknowledged.lock().unwrap().extend_from_slice(ids);
        Ok(())
    }

    async fn restore(&self, ids: &[String]) -> Result<(), QueueError> {
        let claimed = self.claimed.lock().unwrap();
        let mut wait = self.wait.lock().unwrap();
        for id in ids.iter().rev() {
            if let Some(job) = claimed.iter().find(|job| &job.id == id) {
                wait.push_front(job.clone());
            }
        }
        self.restored.lock().unwrap().extend_from_slice(ids);
        Ok(())
    }

    async fn reject(&self, id: &str, _reason: &str) -> Result<(), QueueError> {
        self.rejected.lock().unwrap().push(id.to_string());
        Ok(())
    }
}
