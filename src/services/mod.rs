//! Request handling services.

pub mod contact;

pub use contact::{ContactService, SendEmailResponse};
