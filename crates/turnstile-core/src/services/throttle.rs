//! Request-level composition of the policy table and the window limiter.

use std::sync::Arc;

use crate::domain::{CounterKey, PolicyTable};
use crate::services::WindowLimiter;

/// Default namespace for counter keys.
pub const DEFAULT_NAMESPACE: &str = "rate";

/// Outcome of admitting one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// No policy covers the path.
    Unthrottled,
    /// Counted and within budget (or the store failed and we failed open).
    Allowed,
    /// Over budget for the policy registered under `prefix`.
    Rejected { prefix: String },
}

impl Admission {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Admission::Rejected { .. })
    }
}

/// Stateless admission check; all durable state lives in the counter store.
#[derive(Clone)]
pub struct Throttle {
    table: Arc<PolicyTable>,
    limiter: WindowLimiter,
    namespace: String,
}

impl Throttle {
    pub fn new(
        table: Arc<PolicyTable>,
        limiter: WindowLimiter,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            table,
            limiter,
            namespace: namespace.into(),
        }
    }

    pub fn table(&self) -> &PolicyTable {
        &self.table
    }

    pub async fn admit(&self, path: &str, client_id: &str) -> Admission {
        let Some(matched) = self.table.resolve(path) else {
            return Admission::Unthrottled;
        };

        let key = CounterKey::compose(&self.namespace, matched.prefix, client_id);
        if self.limiter.check(&key, matched.policy).await {
            Admission::Rejected {
                prefix: matched.prefix.to_string(),
            }
        } else {
            Admission::Allowed
        }
    }
}
