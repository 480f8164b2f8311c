//! Core library with the contact form model, validation and error handling.
//!
//! This crate provides the pieces of the relay that do not touch the network:
//! - `ContactForm` → `Submission` validation and sanitizing
//! - Email address normalization and HTML escaping helpers
//! - `AppError` with automatic conversion into HTTP responses

pub mod error;
pub mod validation;

pub use error::{AppError, AppResult, DELIVERY_FAILED_MESSAGE, DeliveryExt};
pub use validation::{ContactForm, FieldViolation, Submission, escape_html, normalize_email};
