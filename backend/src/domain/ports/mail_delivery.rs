//! Port for delivering rendered emails.

use async_trait::async_trait;

use crate::domain::EmailAddress;

use super::define_port_error;

define_port_error! {
    /// Errors raised by mail delivery adapters.
    pub enum MailDeliveryError {
        /// The relay could not be reached.
        Transport { message: String } => "mail transport failed: {message}",
        /// The relay refused the message.
        Rejected { status: u16, message: String } =>
            "mail relay rejected message with status {status}: {message}",
    }
}

/// One rendered email addressed to a single recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: EmailAddress,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Port for sending email.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailDelivery: Send + Sync {
    /// Deliver one message. No retry is attempted by callers.
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailDeliveryError>;
}
