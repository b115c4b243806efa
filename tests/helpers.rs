// Shared test helpers for database setup and test data creation.
//
// Writes go through the same `AnyPool` the service uses; reads go through a
// typed `SqlitePool` on the same file so assertions do not depend on the Any
// driver's column decoding.

#![allow(dead_code)] // Each test file uses a different subset

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::{AnyPool, Row, SqlitePool};
use tempfile::TempDir;

use queue_batcher::storage::init_db_pool;
use queue_batcher::{JobSource, QueueError, QueueRecord, QueuedJob};

/// A SQLite database file living in its own temporary directory.
pub struct TestDb {
    _dir: TempDir,
    pub path: PathBuf,
}

impl TestDb {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("messages.db");
        TestDb { _dir: dir, path }
    }

    pub fn url(&self) -> String {
        sqlite_url(&self.path)
    }

    /// Pool the service would use to write.
    pub async fn any_pool(&self) -> AnyPool {
        init_db_pool(&self.url(), 1)
            .await
            .expect("Failed to create AnyPool")
    }

    /// Typed pool used only for verification.
    pub async fn reader(&self) -> SqlitePool {
        SqlitePool::connect(&self.url())
            .await
            .expect("Failed to open verification pool")
    }
}

pub fn sqlite_url(path: &Path) -> String {
    format!("sqlite:{}?mode=rwc", path.display())
}

/// One row of `messages` as strings: (msg_id, message, user_id, timestamp).
pub type MessageRow = (String, String, String, String);

pub async fn fetch_messages(pool: &SqlitePool) -> Vec<MessageRow> {
    sqlx::query("SELECT msg_id, message, user_id, timestamp FROM messages ORDER BY msg_id")
        .fetch_all(pool)
        .await
        .expect("Failed to read messages")
        .into_iter()
        .map(|row| {
            (
                row.try_get_unchecked::<String, _>(0).unwrap(),
                row.try_get_unchecked::<String, _>(1).unwrap(),
                row.try_get_unchecked::<String, _>(2).unwrap(),
                row.try_get_unchecked::<String, _>(3).unwrap(),
            )
        })
        .collect()
}

pub async fn messages_table_exists(pool: &SqlitePool) -> bool {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='messages'",
    )
    .fetch_one(pool)
    .await
    .map(|count| count > 0)
    .unwrap_or(false)
}

pub fn two_message_batch() -> Vec<QueueRecord> {
    vec![
        QueueRecord::new("1", "Hello, world!", "user1", "2023-04-01T12:00:00Z"),
        QueueRecord::new("2", "Goodbye, world!", "user2", "2023-04-02T12:00:00Z"),
    ]
}

pub fn job_for(record: &QueueRecord) -> QueuedJob {
    QueuedJob {
        id: record.id.clone(),
        data: Some(serde_json::to_string(record).expect("record serializes")),
    }
}

/// In-memory wait list with the oldest job at the front.
#[derive(Default)]
pub struct InMemoryQueue {
    wait: Mutex<VecDeque<QueuedJob>>,
    acknowledged: Mutex<Vec<String>>,
}

impl InMemoryQueue {
    pub fn with_records(records: &[QueueRecord]) -> Self {
        InMemoryQueue {
            wait: Mutex::new(records.iter().map(job_for).collect()),
            acknowledged: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, record: &QueueRecord) {
        self.wait.lock().unwrap().push_back(job_for(record));
    }

    pub fn waiting(&self) -> usize {
        self.wait.lock().unwrap().len()
    }

    pub fn acknowledged(&self) -> Vec<String> {
        self.acknowledged.lock().unwrap().clone()
    }
}

#[async_trait]
impl queue_batcher::BacklogSource for InMemoryQueue {
    async fn backlog_count(&self) -> Result<u64, QueueError> {
        Ok(self.waiting() as u64)
    }
}

#[async_trait]
impl JobSource for InMemoryQueue {
    async fn take_batch(&self, max: usize) -> Result<Vec<QueuedJob>, QueueError> {
        let mut wait = self.wait.lock().unwrap();
        let count = max.min(wait.len());
        Ok(wait.drain(..count).collect())
    }

    async fn acknowledge(&self, ids: &[String]) -> Result<(), QueueError> {
        self.acknowledged.lock().unwrap().extend_from_slice(ids);
        Ok(())
    }

    async fn restore(&self, _ids: &[String]) -> Result<(), QueueError> {
        Ok(())
    }

    async fn reject(&self, _id: &str, _reason: &str) -> Result<(), QueueError> {
        Ok(())
    }
}
