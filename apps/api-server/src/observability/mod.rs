//! Observability module - request IDs and per-request spans.

mod request_id;

pub use request_id::{REQUEST_ID_HEADER, RequestId, RequestIdMiddleware};
