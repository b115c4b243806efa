//! SQL statements for the `messages` table.
//!
//! The table DDL is portable between MySQL and SQLite. The bulk upsert differs
//! only in its conflict clause, which is a no-op update of the primary key so
//! that a re-delivered record never overwrites the row already stored.

/// Idempotent table setup, issued on every persist.
pub const CREATE_MESSAGES_TABLE: &str = "CREATE TABLE IF NOT EXISTS messages (msg_id VARCHAR(255) PRIMARY KEY, message TEXT, user_id VARCHAR(255), timestamp TIMESTAMP)";

const INSERT_MESSAGES_PREFIX: &str =
    "INSERT INTO messages (msg_id, message, user_id, timestamp) VALUES ";

const MESSAGE_ROW_PLACEHOLDERS: &str = "(?, ?, ?, ?)";

/// Number of bound parameters per record.
pub const MESSAGE_COLUMN_COUNT: usize = 4;

/// SQL dialect of the connected store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// MySQL / MariaDB (`ON DUPLICATE KEY UPDATE`)
    MySql,
    /// SQLite (`ON CONFLICT ... DO UPDATE`)
    Sqlite,
}

impl Dialect {
    /// Maps a driver backend name (as reported by `sqlx`) to a dialect.
    pub fn from_backend_name(name: &str) -> Self {
        if name.to_ascii_lowercase().contains("mysql") {
            Dialect::MySql
        } else {
            Dialect::Sqlite
        }
    }

    fn conflict_clause(&self) -> &'static str {
        match self {
            Dialect::MySql => " ON DUPLICATE KEY UPDATE msg_id = VALUES(msg_id)",
            Dialect::Sqlite => " ON CONFLICT(msg_id) DO UPDATE SET msg_id = excluded.msg_id",
        }
    }

    /// Builds one multi-row insert-or-ignore statement for `row_count` records.
    ///
    /// `row_count` must be at least 1; an empty batch never reaches the store.
    pub fn bulk_upsert(&self, row_count: usize) -> String {
        let values = vec![MESSAGE_ROW_PLACEHOLDERS; row_count].join(", ");
        format!(
            "{}{}{}",
            INSERT_MESSAGES_PREFIX,
            values,
            self.conflict_clause()
        )
    }
}
