//! Router assembly and serving.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Path normalization (trailing slashes trimmed before routing)
//! 2. Sentry hub + HTTP transaction
//! 3. `TraceLayer` span (method, uri, `request_id`, status, latency)
//! 4. Request ID
//! 5. Session (signed cookie, in-memory store)
//! 6. Security headers
//! 7. Rate limits on `/auth` and `/api` (production router only)

use std::future::Future;
use std::net::SocketAddr;

use axum::{
    Router, ServiceExt,
    extract::{Request, State},
    http::StatusCode,
    routing::get,
};
use tokio::net::TcpListener;
use tower::Layer;
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::{
    api_rate_limiter, auth_rate_limiter, create_session_layer, request_id_middleware,
    security_headers_middleware,
};
use crate::routes;
use crate::state::AppState;

/// Full router without rate limits.
pub fn router(state: AppState) -> Router {
    build(state, false)
}

/// Full router with the per-IP rate limits used in production.
pub fn rate_limited_router(state: AppState) -> Router {
    build(state, true)
}

fn build(state: AppState, rate_limited: bool) -> Router {
    let session_layer = create_session_layer(state.config());

    let mut api = routes::api_routes();
    let mut auth = routes::auth_routes();
    if rate_limited {
        api = api.layer(api_rate_limiter());
        auth = auth.layer(auth_rate_limiter());
    }

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api)
        .nest("/auth", auth)
        .merge(routes::page_routes())
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Serve a router until `shutdown` resolves.
///
/// Trailing slashes are trimmed before routing, and the peer address is
/// made available to the rate limiter.
///
/// # Errors
///
/// Returns an error if accepting connections fails.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = NormalizePathLayer::trim_trailing_slash().layer(router);
    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown)
    .await
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the backend health endpoint does not answer.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.backend().health().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Backend not ready");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use tower::ServiceExt as _;

    use super::*;
    use crate::config::tests::test_config;

    fn app() -> Router {
        // Nothing listens on port 9; backend calls fail fast.
        router(AppState::new(test_config("http://127.0.0.1:9")).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(HttpRequest::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_readiness_fails_without_backend() {
        let response = app()
            .oneshot(HttpRequest::get("/health/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_session_endpoint_is_anonymous_by_default() {
        let response = app()
            .oneshot(HttpRequest::get("/api/session").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["user"].is_null());
    }

    #[tokio::test]
    async fn test_auth_proxy_requires_sign_in() {
        let response = app()
            .oneshot(
                HttpRequest::get("/api/auth-proxy/orders")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_result_status_is_not_found() {
        let response = app()
            .oneshot(
                HttpRequest::get("/checkout/result/maybe")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
