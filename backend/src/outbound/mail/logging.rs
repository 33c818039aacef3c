//! Mail sink that logs each message and reports success.

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{MailDelivery, MailDeliveryError, OutgoingMail};

/// Development mail adapter; nothing leaves the process.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingMailDelivery;

#[async_trait]
impl MailDelivery for LoggingMailDelivery {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailDeliveryError> {
        info!(
            to = %mail.to,
            subject = %mail.subject,
            body_chars = mail.text_body.chars().count(),
            "mail delivery disabled; message logged only"
        );
        Ok(())
    }
}
