//! Rate limiting middleware.
//!
//! Resolves the request path against the policy table and counts the request
//! against the caller's window. Over-budget requests are answered in-band: HTTP
//! 200 with `{"status": false, "reason": ...}`, and never reach the handler.

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

use turnstile_core::{Admission, Throttle};
use turnstile_shared::ThrottledResponse;

/// Rate limiting middleware factory.
pub struct ThrottleMiddleware {
    throttle: Arc<Throttle>,
    trust_forwarded: bool,
}

impl ThrottleMiddleware {
    pub fn new(throttle: Arc<Throttle>) -> Self {
        Self {
            throttle,
            trust_forwarded: true,
        }
    }

    /// Whether `Forwarded` / `X-Forwarded-For` identify the client.
    /// When disabled only the socket peer address is used.
    pub fn trust_forwarded_headers(mut self, trust: bool) -> Self {
        self.trust_forwarded = trust;
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for ThrottleMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = ThrottleMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ThrottleMiddlewareService {
            service: Rc::new(service),
            throttle: self.throttle.clone(),
            trust_forwarded: self.trust_forwarded,
        }))
    }
}

pub struct ThrottleMiddlewareService<S> {
    service: Rc<S>,
    throttle: Arc<Throttle>,
    trust_forwarded: bool,
}

fn client_identity(req: &ServiceRequest, trust_forwarded: bool) -> String {
    if trust_forwarded {
        // Forwarded headers first, then the peer address
        req.connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string()
    } else {
        req.peer_addr()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

impl<S, B> Service<ServiceRequest> for ThrottleMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let throttle = self.throttle.clone();

        let client_id = client_identity(&req, self.trust_forwarded);

        // Match on the percent-decoded path the router uses, not the raw URI
        let path = req.match_info().as_str().to_string();

        Box::pin(async move {
            let admission = throttle.admit(&path, &client_id).await;

            if let Admission::Rejected { prefix } = admission {
                tracing::warn!(
                    client = %client_id,
                    prefix = %prefix,
                    path = %path,
                    "Rate limit exceeded"
                );

                let response = HttpResponse::Ok().json(ThrottledResponse::default());
                return Ok(req.into_response(response).map_into_right_body());
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test, web};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::time::Duration;

    use turnstile_core::ports::{CounterStore, CounterStoreError};
    use turnstile_core::{PolicyTable, RatePolicy, WindowLimiter};
    use turnstile_infra::InMemoryCounterStore;

    struct DownStore;

    #[async_trait]
    impl CounterStore for DownStore {
        async fn incr(&self, _key: &str) -> Result<i64, CounterStoreError> {
            Err(CounterStoreError::Connection("connection refused".to_string()))
        }

        async fn expire(&self, _key: &str, _ttl: Duration) -> Result<bool, CounterStoreError> {
            Err(CounterStoreError::Connection("connection refused".to_string()))
        }
    }

    fn throttle(store: Arc<dyn CounterStore>) -> Arc<Throttle> {
        let table = PolicyTable::new([
            ("/login", RatePolicy::new(10, 2).unwrap()),
            ("/card", RatePolicy::new(1, 5).unwrap()),
        ])
        .unwrap();

        Arc::new(Throttle::new(
            Arc::new(table),
            WindowLimiter::new(store),
            "rate",
        ))
    }

    async fn handled() -> HttpResponse {
        HttpResponse::Ok().json(json!({ "status": true }))
    }

    fn request(path: &str, client: &str) -> actix_web::test::TestRequest {
        test::TestRequest::get()
            .uri(path)
            .insert_header(("X-Forwarded-For", client))
    }

    macro_rules! app {
        ($store:expr) => {
            app!($store, true)
        };
        ($store:expr, $trust_forwarded:expr) => {
            test::init_service(
                App::new()
                    .wrap(
                        ThrottleMiddleware::new(throttle($store))
                            .trust_forwarded_headers($trust_forwarded),
                    )
                    .route("/login", web::get().to(handled))
                    .route("/card/{id}", web::get().to(handled))
                    .route("/health", web::get().to(handled)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_over_budget_rejected_in_band() {
        let app = app!(Arc::new(InMemoryCounterStore::new()));

        for _ in 0..2 {
            let body: Value =
                test::call_and_read_body_json(&app, request("/login", "10.0.0.1").to_request())
                    .await;
            assert_eq!(body["status"], true);
        }

        let resp = test::call_service(&app, request("/login", "10.0.0.1").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body,
            json!({
                "status": false,
                "reason": "You have sent too many requests. Please try again later."
            })
        );
    }

    #[actix_web::test]
    async fn test_clients_have_separate_budgets() {
        let app = app!(Arc::new(InMemoryCounterStore::new()));

        for _ in 0..3 {
            test::call_service(&app, request("/login", "10.0.0.1").to_request()).await;
        }

        let body: Value =
            test::call_and_read_body_json(&app, request("/login", "10.0.0.2").to_request()).await;
        assert_eq!(body["status"], true);
    }

    #[actix_web::test]
    async fn test_subpaths_share_prefix_budget() {
        let app = app!(Arc::new(InMemoryCounterStore::new()));

        let mut statuses = Vec::new();
        for id in 0..6 {
            let uri = format!("/card/{}", id);
            let body: Value =
                test::call_and_read_body_json(&app, request(&uri, "A").to_request()).await;
            statuses.push(body["status"].as_bool().unwrap());
        }

        assert_eq!(statuses, vec![true, true, true, true, true, false]);
    }

    #[actix_web::test]
    async fn test_unmatched_path_never_throttled() {
        let app = app!(Arc::new(InMemoryCounterStore::new()));

        for _ in 0..50 {
            let body: Value =
                test::call_and_read_body_json(&app, request("/health", "A").to_request()).await;
            assert_eq!(body["status"], true);
        }
    }

    #[actix_web::test]
    async fn test_store_outage_fails_open() {
        let app = app!(Arc::new(DownStore));

        for _ in 0..10 {
            let body: Value =
                test::call_and_read_body_json(&app, request("/login", "A").to_request()).await;
            assert_eq!(body["status"], true);
        }
    }

    #[actix_web::test]
    async fn test_percent_encoded_path_counts_against_prefix() {
        let app = app!(Arc::new(InMemoryCounterStore::new()));

        let mut statuses = Vec::new();
        for _ in 0..10 {
            let resp = test::call_service(&app, request("/%6Cogin", "A").to_request()).await;
            assert_eq!(resp.status(), StatusCode::OK);
            let body: Value = test::read_body_json(resp).await;
            statuses.push(body["status"].as_bool().unwrap());
        }

        assert_eq!(&statuses[..2], &[true, true]);
        assert!(statuses[2..].iter().all(|allowed| !allowed));
    }

    #[actix_web::test]
    async fn test_encoded_and_plain_paths_share_budget() {
        let app = app!(Arc::new(InMemoryCounterStore::new()));

        test::call_service(&app, request("/login", "A").to_request()).await;
        test::call_service(&app, request("/%6Cogin", "A").to_request()).await;

        let body: Value =
            test::call_and_read_body_json(&app, request("/login", "A").to_request()).await;
        assert_eq!(body["status"], false);
    }

    #[actix_web::test]
    async fn test_untrusted_forwarded_header_ignored() {
        let app = app!(Arc::new(InMemoryCounterStore::new()), false);
        let peer: std::net::SocketAddr = "192.0.2.7:40000".parse().unwrap();

        let mut statuses = Vec::new();
        for i in 0..4 {
            let req = request("/login", &format!("10.0.0.{}", i))
                .peer_addr(peer)
                .to_request();
            let body: Value = test::call_and_read_body_json(&app, req).await;
            statuses.push(body["status"].as_bool().unwrap());
        }

        assert_eq!(statuses, vec![true, true, false, false]);
    }
}
