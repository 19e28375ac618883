//! Middleware modules.

pub mod throttle;

pub use throttle::ThrottleMiddleware;
