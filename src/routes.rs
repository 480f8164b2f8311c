//! REST routes and health check handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::{Json, Router};
#[cfg(feature = "prometheus")]
use contact_telemetry::PrometheusHandle;
use http::StatusCode;
use serde::Serialize;
use tower_http::timeout::TimeoutLayer;

use crate::middleware::{AllowedOrigins, RateLimiter, rate_limit, reject_foreign_origin};
use crate::services::contact::send_email;
use crate::services::ContactService;

/// Request timeout for routes without their own deadline.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum accepted request body (100 KiB).
pub const MAX_BODY_BYTES: usize = 100 * 1024;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

/// Build REST routes.
///
/// Only `/send-email` sits behind the origin guard and the rate limiter. It has
/// no request timeout: the SMTP transport bounds the send, and its failures must
/// surface as delivery errors rather than `408`.
pub fn rest_routes(
    contact: ContactService,
    origins: AllowedOrigins,
    limiter: Arc<RateLimiter>,
) -> Router {
    let relay = Router::new()
        .route("/send-email", post(send_email))
        .route_layer(from_fn_with_state(limiter, rate_limit))
        .route_layer(from_fn_with_state(origins, reject_foreign_origin))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(contact);

    Router::new()
        .route("/", get(|| async { "contact-relay" }))
        .route("/health", get(health))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
        .merge(relay)
}

/// Prometheus scrape endpoint.
#[cfg(feature = "prometheus")]
pub fn metrics_routes(handle: PrometheusHandle) -> Router {
    Router::new().route(
        "/metrics",
        get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }),
    )
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}
