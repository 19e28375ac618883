//! In-process counter store for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::ports::{CounterStore, CounterStoreError};

#[derive(Default)]
struct Counter {
    value: i64,
    ttl: Option<Duration>,
}

/// Counter store whose failures and window expiry are driven by the test.
#[derive(Default)]
pub struct FakeCounterStore {
    counters: Mutex<HashMap<String, Counter>>,
    fail_incr: AtomicBool,
    fail_expire: AtomicBool,
    incr_calls: AtomicUsize,
    expire_calls: AtomicUsize,
}

impl FakeCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_incr(&self, fail: bool) {
        self.fail_incr.store(fail, Ordering::SeqCst);
    }

    pub fn fail_expire(&self, fail: bool) {
        self.fail_expire.store(fail, Ordering::SeqCst);
    }

    /// Simulate the TTL running out.
    pub fn elapse(&self, key: &str) {
        self.counters.lock().unwrap().remove(key);
    }

    pub fn count_of(&self, key: &str) -> Option<i64> {
        self.counters.lock().unwrap().get(key).map(|c| c.value)
    }

    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        self.counters.lock().unwrap().get(key).and_then(|c| c.ttl)
    }

    pub fn incr_calls(&self) -> usize {
        self.incr_calls.load(Ordering::SeqCst)
    }

    pub fn expire_calls(&self) -> usize {
        self.expire_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CounterStore for FakeCounterStore {
    async fn incr(&self, key: &str) -> Result<i64, CounterStoreError> {
        self.incr_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_incr.load(Ordering::SeqCst) {
            return Err(CounterStoreError::Connection("store down".to_string()));
        }

        let mut counters = self.counters.lock().unwrap();
        let counter = counters.entry(key.to_string()).or_default();
        counter.value += 1;
        Ok(counter.value)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CounterStoreError> {
        self.expire_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_expire.load(Ordering::SeqCst) {
            return Err(CounterStoreError::Timeout);
        }

        let mut counters = self.counters.lock().unwrap();
        match counters.get_mut(key) {
            Some(counter) => {
                counter.ttl = Some(ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
