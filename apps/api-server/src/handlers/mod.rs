//! HTTP handlers and route configuration.

mod health;

use actix_web::{HttpRequest, HttpResponse, web};
use turnstile_shared::ErrorResponse;

use crate::observability::RequestId;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api").route("/health", web::get().to(health::health_check)));
}

/// Fallback for unknown routes - RFC 7807 body tagged with the request ID.
pub async fn not_found(req: HttpRequest, request_id: RequestId) -> HttpResponse {
    let error = ErrorResponse::not_found(format!("No route for {}", req.path()))
        .with_request_id(request_id.as_str());

    HttpResponse::NotFound().json(error)
}
