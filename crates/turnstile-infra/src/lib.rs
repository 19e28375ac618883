//! # Turnstile Infrastructure
//!
//! Concrete implementations of the ports defined in `turnstile-core`.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `redis` - Redis-backed shared counters

pub mod counter;

// Re-exports - In-Memory
pub use counter::InMemoryCounterStore;

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use counter::{RedisConfig, RedisCounterStore};
