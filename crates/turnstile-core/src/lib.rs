//! # Turnstile Core
//!
//! The admission-control layer of Turnstile.
//! Path-prefix rate policies, counter key composition, and the fixed-window
//! limiter. Storage is reached only through the [`ports::CounterStore`] trait.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use domain::{CounterKey, PolicyTable, RatePolicy};
pub use error::DomainError;
pub use services::{Admission, Throttle, WindowLimiter};
