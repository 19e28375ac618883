//! Services - admission logic built on top of the ports.

mod throttle;
mod window_limiter;

#[cfg(test)]
pub(crate) mod fake;

pub use throttle::{Admission, DEFAULT_NAMESPACE, Throttle};
pub use window_limiter::WindowLimiter;
