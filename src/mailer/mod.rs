//! Outbound email delivery.

pub mod mailgun;

use std::sync::Arc;

use reqwest::StatusCode;
use thiserror::Error;

pub use mailgun::MailgunTransport;

/// Errors that can occur while handing an email to the transport.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("email transport is not configured: {0}")]
    NotConfigured(&'static str),
    #[error("recipient email (to) is required")]
    MissingRecipient,
    #[error("email subject is required")]
    MissingSubject,
    #[error("email body (text or html) is required")]
    MissingBody,
    #[error("email transport HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("email transport returned status {status}: {body}")]
    Service { status: StatusCode, body: String },
    #[error("failed to decode email transport response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A fully composed email ready for delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
}

impl OutgoingEmail {
    /// Reject emails without a recipient, subject, or any body.
    pub fn validate(&self) -> Result<(), DeliveryError> {
        if self.to.trim().is_empty() {
            return Err(DeliveryError::MissingRecipient);
        }
        if self.subject.trim().is_empty() {
            return Err(DeliveryError::MissingSubject);
        }
        let has_html = self.html.as_deref().is_some_and(|html| !html.is_empty());
        if self.text.is_empty() && !has_html {
            return Err(DeliveryError::MissingBody);
        }
        Ok(())
    }
}

/// Identifier assigned by the transport to an accepted email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub id: String,
}

#[rocket::async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<DeliveryReceipt, DeliveryError>;
}

pub type SharedEmailTransport = Arc<dyn EmailTransport>;

/// Stand-in used when no delivery credentials are configured.
pub struct UnconfiguredTransport;

#[rocket::async_trait]
impl EmailTransport for UnconfiguredTransport {
    async fn send(&self, _email: &OutgoingEmail) -> Result<DeliveryReceipt, DeliveryError> {
        Err(DeliveryError::NotConfigured(
            "MAILGUN_API_KEY and MAILGUN_DOMAIN must be set",
        ))
    }
}
