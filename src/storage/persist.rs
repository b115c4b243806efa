//! Batch persistence.
//!
//! Writes a batch of queue records into the `messages` table with a single
//! multi-row upsert. Re-delivered records are absorbed by the primary key
//! conflict clause, so persisting the same batch twice is harmless.

use std::sync::Arc;

use log::{debug, info};

use crate::error_handling::DatabaseError;
use crate::storage::models::QueueRecord;
use crate::storage::pool::{ConnectionPool, StoreConnection};
use crate::storage::statements::CREATE_MESSAGES_TABLE;

/// Idempotent bulk writer for queue records.
pub struct BatchPersister<P: ConnectionPool> {
    pool: Arc<P>,
}

impl<P: ConnectionPool> Clone for BatchPersister<P> {
    fn clone(&self) -> Self {
        BatchPersister {
            pool: Arc::clone(&self.pool),
        }
    }
}

impl<P: ConnectionPool> BatchPersister<P> {
    /// Creates a persister over a shared pool.
    pub fn new(pool: Arc<P>) -> Self {
        BatchPersister { pool }
    }

    /// Persists `batch` and returns the number of records submitted.
    ///
    /// Exactly one connection is borrowed and it is released on every path,
    /// including statement failures. Errors are returned to the caller
    /// unchanged; nothing is retried here.
    ///
    /// An empty batch only ensures the table exists.
    ///
    /// # Errors
    ///
    /// - `DatabaseError::InvalidTimestamp` if a record's timestamp cannot be
    ///   parsed (checked before a connection is borrowed)
    /// - `DatabaseError::SqlError` if acquiring the connection, the table setup
    ///   or the upsert fails
    pub async fn persist(&self, batch: &[QueueRecord]) -> Result<usize, DatabaseError> {
        let rows = batch
            .iter()
            .map(QueueRecord::to_row)
            .collect::<Result<Vec<_>, _>>()?;

        let mut connection = self.pool.acquire().await?;
        let result = write_rows(&mut connection, &rows).await;
        connection.release();
        result?;

        info!("{} records successfully processed.", rows.len());
        Ok(rows.len())
    }
}

async fn write_rows<C: StoreConnection>(
    connection: &mut C,
    rows: &[Vec<String>],
) -> Result<(), DatabaseError> {
    connection.query(CREATE_MESSAGES_TABLE, &[]).await?;

    if rows.is_empty() {
        debug!("Empty batch, skipping upsert");
        return Ok(());
    }

    let sql = connection.dialect().bulk_upsert(rows.len());
    let affected = connection.query(&sql, rows).await?;
    debug!("Upserted {} rows ({} affected)", rows.len(), affected);
    Ok(())
}
