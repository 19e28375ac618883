//! Application state - shared across all handlers.

use std::sync::Arc;

use turnstile_core::ports::{CounterStore, CounterStoreError};
use turnstile_core::{DomainError, PolicyTable, Throttle, WindowLimiter};
use turnstile_infra::InMemoryCounterStore;

#[cfg(feature = "redis")]
use turnstile_infra::RedisCounterStore;

use crate::config::AppConfig;

/// Failures that prevent the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Invalid policy table: {0}")]
    Policy(#[from] DomainError),

    #[error("Counter store unavailable: {0}")]
    CounterStore(#[from] CounterStoreError),
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub throttle: Arc<Throttle>,
    /// Which counter store backs the limiter ("redis" or "memory").
    pub counter_backend: &'static str,
}

impl AppState {
    /// Build the policy table and counter store, then the throttle on top of them.
    pub async fn new(config: &AppConfig) -> Result<Self, StartupError> {
        let table = PolicyTable::new(config.throttle.policies.clone())?;
        for (prefix, policy) in table.iter() {
            tracing::debug!(
                prefix,
                window_seconds = policy.window_seconds(),
                max_count = policy.max_count(),
                "Rate policy registered"
            );
        }

        let (store, counter_backend) = Self::counter_store(config).await?;
        let throttle = Throttle::new(
            Arc::new(table),
            WindowLimiter::new(store),
            config.throttle.namespace.clone(),
        );

        tracing::info!(
            policies = throttle.table().len(),
            counter_backend,
            "Application state initialized"
        );

        Ok(Self {
            throttle: Arc::new(throttle),
            counter_backend,
        })
    }

    #[cfg(feature = "redis")]
    async fn counter_store(
        config: &AppConfig,
    ) -> Result<(Arc<dyn CounterStore>, &'static str), StartupError> {
        let Some(redis) = &config.redis else {
            tracing::warn!("REDIS_URL not set. Rate limits are per-instance (in-memory counters).");
            return Ok((Arc::new(InMemoryCounterStore::new()), "memory"));
        };

        match RedisCounterStore::new(redis.clone()).await {
            Ok(store) => Ok((Arc::new(store), "redis")),
            Err(e) if redis.fallback_to_memory => {
                tracing::error!(
                    "Failed to connect to Redis: {}. Using in-memory counters.",
                    e
                );
                Ok((Arc::new(InMemoryCounterStore::new()), "memory"))
            }
            Err(e) => Err(e.into()),
        }
    }

    #[cfg(not(feature = "redis"))]
    async fn counter_store(
        _config: &AppConfig,
    ) -> Result<(Arc<dyn CounterStore>, &'static str), StartupError> {
        tracing::info!("Running without redis feature - using in-memory counters");
        Ok((Arc::new(InMemoryCounterStore::new()), "memory"))
    }
}
