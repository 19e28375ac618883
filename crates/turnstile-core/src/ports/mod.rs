//! Ports - trait definitions for external dependencies.

mod counter_store;

pub use counter_store::{CounterStore, CounterStoreError};
