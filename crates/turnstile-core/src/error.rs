//! Domain-level error types.

use thiserror::Error;

/// Domain errors - raised while building policy configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Duplicate policy prefix: {0}")]
    DuplicatePrefix(String),
}
