//! CORS policy and origin allow-list enforcement.
//!
//! `CorsLayer` answers preflights and decorates responses for browsers. It does
//! not stop a cross-origin request from reaching the handler, so routes with
//! side effects are additionally wrapped in [`reject_foreign_origin`].

use std::sync::Arc;

use axum::Json;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::header::{CONTENT_TYPE, ORIGIN};
use http::{HeaderValue, Method, StatusCode};
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

/// Origins allowed to call the relay.
#[derive(Debug, Clone)]
pub struct AllowedOrigins(Arc<[HeaderValue]>);

impl AllowedOrigins {
    #[must_use]
    pub fn new(origins: Vec<HeaderValue>) -> Self {
        Self(origins.into())
    }

    #[must_use]
    pub fn contains(&self, origin: &HeaderValue) -> bool {
        self.0.iter().any(|allowed| allowed == origin)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeaderValue> {
        self.0.iter()
    }
}

/// CORS layer: POST/OPTIONS only, `Content-Type` header only, listed origins only.
#[must_use]
pub fn build_cors(origins: &AllowedOrigins) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins.iter().cloned()))
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
}

/// Reject requests carrying an `Origin` outside the allow-list with `403`.
///
/// Requests without an `Origin` header (non-browser clients) pass through.
pub async fn reject_foreign_origin(
    State(origins): State<AllowedOrigins>,
    request: Request,
    next: Next,
) -> Response {
    match request.headers().get(ORIGIN) {
        Some(origin) if !origins.contains(origin) => {
            warn!(origin = ?origin, "Rejected request from disallowed origin");
            (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "Origin not allowed" })),
            )
                .into_response()
        }
        _ => next.run(request).await,
    }
}
