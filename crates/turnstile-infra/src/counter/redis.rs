//! Redis counter store - shared counts across every instance on the same Redis.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};

use turnstile_core::ports::{CounterStore, CounterStoreError};

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Deadline for a single INCR or EXPIRE
    pub command_timeout: Duration,
    /// Whether to fallback to in-memory counters if Redis is unavailable
    pub fallback_to_memory: bool,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            command_timeout: Duration::from_millis(250),
            fallback_to_memory: true,
        }
    }
}

impl RedisConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            connect_timeout: Duration::from_secs(
                std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            command_timeout: Duration::from_millis(
                std::env::var("REDIS_COMMAND_TIMEOUT_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(250),
            ),
            fallback_to_memory: std::env::var("REDIS_FALLBACK_TO_MEMORY")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        }
    }
}

/// Redis-backed counter store issuing plain `INCR` and `EXPIRE`.
///
/// Uses connection manager for automatic reconnection; each call works on a
/// cheap clone of it.
pub struct RedisCounterStore {
    conn: ConnectionManager,
    config: RedisConfig,
}

impl RedisCounterStore {
    pub async fn new(config: RedisConfig) -> Result<Self, CounterStoreError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| CounterStoreError::Connection(e.to_string()))?;

        // Use timeout to prevent hanging if Redis is unreachable
        let conn_manager_fut = ConnectionManager::new(client);
        let conn = tokio::time::timeout(config.connect_timeout, conn_manager_fut)
            .await
            .map_err(|_| CounterStoreError::Connection("Connection timed out".to_string()))?
            .map_err(|e| CounterStoreError::Connection(e.to_string()))?;

        tracing::info!(url = %config.url, "Connected to Redis counter store");

        Ok(Self { conn, config })
    }

    async fn bounded<T, F>(&self, command: F) -> Result<T, CounterStoreError>
    where
        F: Future<Output = Result<T, RedisError>>,
    {
        tokio::time::timeout(self.config.command_timeout, command)
            .await
            .map_err(|_| CounterStoreError::Timeout)?
            .map_err(map_redis_error)
    }
}

fn map_redis_error(e: RedisError) -> CounterStoreError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() {
        CounterStoreError::Connection(e.to_string())
    } else {
        CounterStoreError::Operation(e.to_string())
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn incr(&self, key: &str) -> Result<i64, CounterStoreError> {
        let mut conn = self.conn.clone();
        self.bounded(conn.incr::<_, _, i64>(key, 1)).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CounterStoreError> {
        let mut conn = self.conn.clone();
        let seconds = ttl.as_secs().max(1) as i64;
        self.bounded(conn.expire::<_, bool>(key, seconds)).await
    }
}
