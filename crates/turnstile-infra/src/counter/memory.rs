//! In-memory counter store - used as fallback when Redis is unavailable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use turnstile_core::ports::{CounterStore, CounterStoreError};

/// Expired counters are swept once every this many increments.
const SWEEP_INTERVAL: u64 = 1024;

#[derive(Default)]
struct Counter {
    value: i64,
    expires_at: Option<Instant>,
}

impl Counter {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|exp| now >= exp).unwrap_or(false)
    }
}

/// In-memory counters with TTLs, mirroring Redis `INCR`/`EXPIRE` semantics.
///
/// Note: Counts are per-process, not shared across instances, and are lost
/// on restart.
#[derive(Default)]
pub struct InMemoryCounterStore {
    counters: Mutex<HashMap<String, Counter>>,
    ops: AtomicU64,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) counters.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let counters = self.counters.lock().await;
        counters.values().filter(|c| !c.is_expired(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn incr(&self, key: &str) -> Result<i64, CounterStoreError> {
        let now = Instant::now();
        let mut counters = self.counters.lock().await;

        if self.ops.fetch_add(1, Ordering::Relaxed) % SWEEP_INTERVAL == SWEEP_INTERVAL - 1 {
            counters.retain(|_, c| !c.is_expired(now));
        }

        let counter = counters.entry(key.to_string()).or_default();
        if counter.is_expired(now) {
            *counter = Counter::default();
        }
        counter.value += 1;

        Ok(counter.value)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CounterStoreError> {
        let now = Instant::now();
        let mut counters = self.counters.lock().await;

        match counters.get_mut(key) {
            Some(counter) if !counter.is_expired(now) => {
                counter.expires_at = Some(now + ttl);
                Ok(true)
            }
            Some(_) => {
                counters.remove(key);
                Ok(false)
            }
            None => Ok(false),
        }
    }
}
