//! # Turnstile API Server
//!
//! Actix-web server with path-prefix rate limiting in front of every route.

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

mod config;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;

use config::AppConfig;
use middleware::ThrottleMiddleware;
use observability::RequestIdMiddleware;
use state::AppState;
use telemetry::TelemetryConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();

    tracing::info!(
        "Starting Turnstile API Server on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::new(&config).await.map_err(|e| {
        tracing::error!(error = %e, "Startup failed");
        std::io::Error::other(e)
    })?;

    let trust_forwarded = config.throttle.trust_forwarded_headers;
    tracing::info!(trust_forwarded, "Client identity source configured");

    HttpServer::new(move || {
        // Last wrap runs first: logger, then request ID, then throttle
        App::new()
            .wrap(
                ThrottleMiddleware::new(state.throttle.clone())
                    .trust_forwarded_headers(trust_forwarded),
            )
            .wrap(RequestIdMiddleware)
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::configure_routes)
            .default_service(web::to(handlers::not_found))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
