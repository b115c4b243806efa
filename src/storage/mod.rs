// storage/mod.rs
// Database operations module

pub mod models;
pub mod persist;
pub mod pool;
pub mod statements;

// Re-export commonly used items
pub use models::{normalize_timestamp, QueueRecord};
pub use persist::BatchPersister;
pub use pool::{init_db_pool, ConnectionPool, StoreConnection};
pub use statements::{Dialect, CREATE_MESSAGES_TABLE};
