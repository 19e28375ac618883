//! Counter store port.

use async_trait::async_trait;
use std::time::Duration;

/// Shared counter store - abstraction over Redis and in-memory backends.
///
/// Implementations must be safe to call from many requests at once.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically increment `key`, creating it at 1 if absent. Returns the new value.
    async fn incr(&self, key: &str) -> Result<i64, CounterStoreError>;

    /// Arm a time-to-live on `key`.
    /// Returns Ok(false) if the key no longer exists.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CounterStoreError>;
}

/// Counter store errors.
#[derive(Debug, thiserror::Error)]
pub enum CounterStoreError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Command timed out")]
    Timeout,

    #[error("Operation failed: {0}")]
    Operation(String),
}
