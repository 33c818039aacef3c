//! Port for drafting notification text with a language model.
//!
//! Adapters return the raw model text. Extracting the subject and body, and
//! falling back to templates, happens in the notification dispatcher.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by content generation adapters.
    pub enum ContentGenerationError {
        /// Generation is switched off (no API key configured).
        Disabled => "content generation is disabled",
        /// The request did not complete.
        Transport { message: String } => "content generation transport failed: {message}",
        /// The provider did not answer in time.
        Timeout { message: String } => "content generation timed out: {message}",
        /// The provider answered with a non-success status.
        Status { status: u16, message: String } =>
            "content generation failed with status {status}: {message}",
        /// The provider answered without usable text.
        MalformedResponse { message: String } =>
            "content generation response was malformed: {message}",
    }
}

/// Prompt sent to the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRequest {
    pub prompt: String,
}

/// Port for generating free text from a prompt.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Return the generated text for `request`.
    async fn generate(&self, request: &ContentRequest) -> Result<String, ContentGenerationError>;
}

/// Generator used when no model is configured. Always reports `Disabled`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledContentGenerator;

#[async_trait]
impl ContentGenerator for DisabledContentGenerator {
    async fn generate(&self, _request: &ContentRequest) -> Result<String, ContentGenerationError> {
        Err(ContentGenerationError::disabled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_generator_always_errors() {
        let request = ContentRequest {
            prompt: "anything".to_owned(),
        };
        let result = DisabledContentGenerator.generate(&request).await;
        assert_eq!(result, Err(ContentGenerationError::Disabled));
    }
}
