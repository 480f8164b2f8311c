//! In-memory mail transports for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use contact_email::{EmailError, MailTransport, OutgoingEmail};

/// Records every message instead of sending it.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// Fails every send like an SMTP server rejecting the credentials.
pub struct FailingTransport;

#[async_trait]
impl MailTransport for FailingTransport {
    async fn send(&self, _email: &OutgoingEmail) -> Result<(), EmailError> {
        Err(EmailError::SendError(
            "permanent error (535): 5.7.8 Username and Password not accepted".to_string(),
        ))
    }
}

/// Stalls past any request deadline, then fails.
pub struct StalledTransport(pub std::time::Duration);

#[async_trait]
impl MailTransport for StalledTransport {
    async fn send(&self, _email: &OutgoingEmail) -> Result<(), EmailError> {
        tokio::time::sleep(self.0).await;
        Err(EmailError::SendError(
            "Connection error: timed out".to_string(),
        ))
    }
}
