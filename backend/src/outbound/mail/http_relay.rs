//! Reqwest-backed mail relay adapter.
//!
//! Each message is one JSON POST authenticated with a bearer token. Any
//! non-success status is a rejection; the dispatcher counts it as a failed
//! recipient and never retries.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;
use zeroize::Zeroizing;

use crate::domain::EmailAddress;
use crate::domain::ports::{MailDelivery, MailDeliveryError, OutgoingMail};
use crate::outbound::http_preview::body_preview;

/// `From` identity used on every message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailSender {
    pub name: String,
    pub address: EmailAddress,
}

/// Relay endpoint, credentials, and sender identity.
pub struct HttpMailRelayConfig {
    pub endpoint: Url,
    pub token: Zeroizing<String>,
    pub sender: MailSender,
    pub timeout: Duration,
}

/// Mail adapter that submits messages to an HTTP relay.
pub struct HttpMailRelay {
    client: Client,
    endpoint: Url,
    token: Zeroizing<String>,
    sender: MailSender,
}

impl HttpMailRelay {
    /// Build a relay client with a request timeout applied to every call.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: HttpMailRelayConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint,
            token: config.token,
            sender: config.sender,
        })
    }
}

#[derive(Debug, Serialize)]
struct RelayAddressDto<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct RelayMessageDto<'a> {
    from: RelayAddressDto<'a>,
    to: [RelayAddressDto<'a>; 1],
    subject: &'a str,
    text: &'a str,
    html: &'a str,
}

fn relay_message<'a>(sender: &'a MailSender, mail: &'a OutgoingMail) -> RelayMessageDto<'a> {
    RelayMessageDto {
        from: RelayAddressDto {
            name: Some(sender.name.as_str()),
            email: sender.address.as_ref(),
        },
        to: [RelayAddressDto {
            name: None,
            email: mail.to.as_ref(),
        }],
        subject: &mail.subject,
        text: &mail.text_body,
        html: &mail.html_body,
    }
}

#[async_trait]
impl MailDelivery for HttpMailRelay {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailDeliveryError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(self.token.as_str())
            .json(&relay_message(&self.sender, mail))
            .send()
            .await
            .map_err(|error| MailDeliveryError::transport(error.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.bytes().await.unwrap_or_default();
        Err(MailDeliveryError::rejected(
            status.as_u16(),
            body_preview(body.as_ref()),
        ))
    }
}
