//! Structured error handling for the relay endpoints.
//!
//! Provides type-safe error handling with automatic conversion to HTTP
//! responses. Delivery failures are logged in full; the underlying cause is
//! only sent to clients when the caller asks for it.

use std::fmt::Display;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::validation::FieldViolation;

/// Client-facing message for any delivery failure.
pub const DELIVERY_FAILED_MESSAGE: &str = "Failed to send message";

/// Application error type with automatic HTTP response conversion.
#[derive(Debug, Error)]
pub enum AppError {
    /// One or more submitted fields failed validation.
    #[error("Validation failed for {} field(s)", .0.len())]
    Validation(Vec<FieldViolation>),

    /// The mail transport rejected or failed the send.
    #[error("Failed to send message")]
    Delivery { details: Option<String> },
}

impl AppError {
    /// Create a delivery error, keeping the cause only when `expose` is set.
    pub fn delivery(cause: impl Display, expose: bool) -> Self {
        Self::Delivery {
            details: expose.then(|| cause.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ValidationBody<'a> {
    errors: &'a [FieldViolation],
}

#[derive(Serialize)]
struct DeliveryBody<'a> {
    error: &'static str,
    details: Option<&'a str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            Self::Validation(violations) => (
                StatusCode::BAD_REQUEST,
                Json(ValidationBody { errors: violations }),
            )
                .into_response(),
            Self::Delivery { details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(DeliveryBody {
                    error: DELIVERY_FAILED_MESSAGE,
                    details: details.as_deref(),
                }),
            )
                .into_response(),
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for converting transport errors to `AppError` with logging.
pub trait DeliveryExt<T> {
    /// Log the error and convert it to `AppError::Delivery`.
    ///
    /// # Errors
    /// Returns `AppError::Delivery`, carrying the cause only if `expose_details`.
    fn or_delivery_error(self, expose_details: bool) -> AppResult<T>;
}

impl<T, E: Display> DeliveryExt<T> for Result<T, E> {
    fn or_delivery_error(self, expose_details: bool) -> AppResult<T> {
        self.map_err(|e| {
            error!(error = %e, "Email error");
            AppError::delivery(e, expose_details)
        })
    }
}
