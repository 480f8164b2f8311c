//! Contact form relay: validate, compose, send once.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use contact_core::{AppError, AppResult, ContactForm, DeliveryExt};
use contact_email::{ContactEmail, MailTransport};
use serde::Serialize;
use tracing::{debug, info};

/// Body of a successful relay.
#[derive(Debug, Serialize)]
pub struct SendEmailResponse {
    pub success: bool,
}

/// Relays validated submissions to a fixed recipient.
#[derive(Clone)]
pub struct ContactService {
    mailer: Arc<dyn MailTransport>,
    recipient: Arc<str>,
    expose_error_details: bool,
}

impl ContactService {
    #[must_use]
    pub fn new(
        mailer: Arc<dyn MailTransport>,
        recipient: impl Into<Arc<str>>,
        expose_error_details: bool,
    ) -> Self {
        Self {
            mailer,
            recipient: recipient.into(),
            expose_error_details,
        }
    }

    /// Validate the form and send exactly one email for it.
    ///
    /// # Errors
    /// `AppError::Validation` if any field is invalid (nothing is sent),
    /// `AppError::Delivery` if the transport fails.
    pub async fn relay(&self, form: ContactForm) -> AppResult<()> {
        let submission = form.validate().map_err(|violations| {
            metrics::counter!("contact_validation_rejected_total").increment(1);
            debug!(
                fields = ?violations.iter().map(|v| v.path).collect::<Vec<_>>(),
                "Contact form rejected"
            );
            AppError::Validation(violations)
        })?;

        let outgoing = ContactEmail {
            name: submission.name(),
            email: submission.email(),
            message: submission.message(),
        }
        .compose(&self.recipient);

        // Spawned so a client disconnect cannot abort a send halfway.
        let mailer = Arc::clone(&self.mailer);
        let outcome = match tokio::spawn(async move { mailer.send(&outgoing).await }).await {
            Ok(sent) => sent.map_err(|e| e.to_string()),
            Err(join_error) => Err(join_error.to_string()),
        };

        outcome
            .or_delivery_error(self.expose_error_details)
            .inspect_err(|_| metrics::counter!("contact_emails_failed_total").increment(1))?;

        metrics::counter!("contact_emails_sent_total").increment(1);
        info!(reply_to = %submission.email(), "Contact message relayed");
        Ok(())
    }
}

/// `POST /send-email`
///
/// Bodies without a JSON content type are validated as an empty form.
pub async fn send_email(
    State(service): State<ContactService>,
    payload: Result<Json<ContactForm>, JsonRejection>,
) -> AppResult<Response> {
    let form = match payload {
        Ok(Json(form)) => form,
        Err(JsonRejection::MissingJsonContentType(_)) => ContactForm::default(),
        Err(rejection) => return Ok(rejection.into_response()),
    };

    service.relay(form).await?;
    Ok(Json(SendEmailResponse { success: true }).into_response())
}
