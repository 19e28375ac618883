//! Fixed-window counter backed by a shared counter store.

use std::sync::Arc;

use crate::domain::{CounterKey, RatePolicy};
use crate::ports::CounterStore;

/// Enforces one fixed-window budget per counter key.
///
/// All state lives in the counter store, so every instance sharing a store
/// shares the same counts.
#[derive(Clone)]
pub struct WindowLimiter {
    store: Arc<dyn CounterStore>,
}

impl WindowLimiter {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    /// Count one request against `key` and report whether it must be rejected.
    ///
    /// Returns `true` when the request exceeds the budget. Store failures on
    /// the increment fail open and return `false`.
    pub async fn check(&self, key: &CounterKey, policy: &RatePolicy) -> bool {
        let count = match self.store.incr(key.as_str()).await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Counter increment failed, failing open");
                return false;
            }
        };

        // Only the request that created the counter arms the window.
        if count == 1 {
            match self.store.expire(key.as_str(), policy.window()).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::warn!(key = %key, "Counter vanished before expiry was armed");
                }
                Err(e) => {
                    tracing::warn!(
                        key = %key,
                        error = %e,
                        "Failed to arm counter expiry, key may persist without TTL"
                    );
                }
            }
        }

        let rejected = policy.is_exceeded_by(count);
        tracing::debug!(
            key = %key,
            count,
            max_count = policy.max_count(),
            rejected,
            "Window checked"
        );

        rejected
    }
}
