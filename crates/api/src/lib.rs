//! Stride API library.
//!
//! JSON REST service for the Stride shoe shop: carts and checkout for
//! shoppers, the catalog, and the order workflow behind the admin
//! dashboard. The router is built by [`app`] so the binary and the
//! integration tests serve exactly the same stack.
//!
//! # Security
//!
//! Shopper routes require a signed bearer token; order administration and
//! catalog writes require a token with the `admin` role.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::{Router, routing::get};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Build the full application: health checks, API routes and middleware.
pub fn app(state: AppState) -> Router {
    let cors = state.config().cors_origin.as_deref().and_then(cors_layer);

    let router = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
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
        );

    let router = match cors {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// CORS for the admin dashboard origin. `None` if the origin is not a valid header.
fn cors_layer(origin: &str) -> Option<CorsLayer> {
    let origin = HeaderValue::from_str(origin).ok()?;
    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::exact(origin))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
    )
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use secrecy::SecretString;
    use stride_core::{Role, UserId};
    use tower::ServiceExt;

    use super::*;
    use crate::config::ApiConfig;
    use crate::db::MemoryStore;

    fn state() -> AppState {
        let config = ApiConfig::local(SecretString::from("Fz8!kQ2#wL9@rT4$yH7^uB3&nM6*pD1x"));
        AppState::new(config, Arc::new(MemoryStore::new()))
    }

    async fn body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(state())
            .oneshot(Request::get("/health/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_user_route_requires_token() {
        let response = app(state())
            .oneshot(Request::get("/orders/cart").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body(response).await["error"], "unauthorized");
    }

    #[tokio::test]
    async fn test_admin_route_forbids_customers() {
        let state = state();
        let token = state.tokens().mint(UserId::new(5), Role::Customer).unwrap();
        let response = app(state)
            .oneshot(
                Request::get("/orders/orders/all")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_malformed_json_is_validation_error() {
        let state = state();
        let token = state.tokens().mint(UserId::new(5), Role::Customer).unwrap();
        let response = app(state)
            .oneshot(
                Request::post("/orders/cart/add")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body(response).await["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_empty_cart_message() {
        let state = state();
        let token = state.tokens().mint(UserId::new(5), Role::Customer).unwrap();
        let response = app(state)
            .oneshot(
                Request::get("/orders/cart")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body(response).await;
        assert_eq!(body["message"], "Cart is empty");
        assert_eq!(body["data"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_unknown_dashboard_page() {
        let state = state();
        let token = state.tokens().mint(UserId::new(1), Role::Admin).unwrap();
        let response = app(state)
            .oneshot(
                Request::get("/orders/dashboard/teleported")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_cors_layer_rejects_invalid_origin() {
        assert!(cors_layer("https://admin.stride.test").is_some());
        assert!(cors_layer("bad\norigin").is_none());
    }
}
