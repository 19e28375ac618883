use std::time::Duration;

use crate::error::DomainError;

/// A fixed-window budget: at most `max_count` requests per `window_seconds`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatePolicy {
    window_seconds: u64,
    max_count: u64,
}

impl RatePolicy {
    /// Both values must be positive.
    pub fn new(window_seconds: u64, max_count: u64) -> Result<Self, DomainError> {
        if window_seconds == 0 {
            return Err(DomainError::Validation(
                "window_seconds must be greater than zero".to_string(),
            ));
        }
        if max_count == 0 {
            return Err(DomainError::Validation(
                "max_count must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            window_seconds,
            max_count,
        })
    }

    pub fn window_seconds(&self) -> u64 {
        self.window_seconds
    }

    pub fn max_count(&self) -> u64 {
        self.max_count
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }

    /// Whether a post-increment count falls outside the budget.
    ///
    /// The request that lands exactly on `max_count` is still allowed.
    pub fn is_exceeded_by(&self, count: i64) -> bool {
        count > 0 && count as u64 > self.max_count
    }
}
