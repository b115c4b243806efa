//! Redis key names for one queue.

use crate::config::QUEUE_KEY_PREFIX;

/// Key layout of a Bull-style queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueKeys {
    base: String,
}

impl QueueKeys {
    /// Keys of queue `queue_name` under the Bull prefix.
    pub fn new(queue_name: &str) -> Self {
        QueueKeys {
            base: format!("{}:{}", QUEUE_KEY_PREFIX, queue_name),
        }
    }

    /// List of waiting job ids (producers push on the left).
    pub fn wait(&self) -> String {
        format!("{}:wait", self.base)
    }

    /// Sorted set of failed job ids, scored by failure time.
    pub fn failed(&self) -> String {
        format!("{}:failed", self.base)
    }

    /// Hash holding one job (`data`, `failedReason`, ...).
    pub fn job(&self, id: &str) -> String {
        format!("{}:{}", self.base, id)
    }
}
