//! Domain types - rate policies, the prefix table, and counter keys.

mod counter_key;
mod policy;
mod policy_table;

pub use counter_key::CounterKey;
pub use policy::RatePolicy;
pub use policy_table::{PolicyMatch, PolicyTable};
