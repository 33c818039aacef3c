//! Reqwest-backed content generator.
//!
//! This adapter owns transport details only: the request body, the API key
//! query parameter, timeout and status mapping, and extracting the first
//! candidate's text.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use zeroize::Zeroizing;

use super::dto::{GenerateRequestDto, GenerateResponseDto};
use crate::domain::ports::{ContentGenerationError, ContentGenerator, ContentRequest};
use crate::outbound::http_preview::body_preview;

/// Endpoint and credentials for the generator.
pub struct HttpContentGeneratorConfig {
    /// API root, for example `https://generativelanguage.googleapis.com/v1beta/`.
    pub base_url: Url,
    /// Model name inserted into `models/{model}:generateContent`.
    pub model: String,
    pub api_key: Zeroizing<String>,
    pub timeout: Duration,
}

/// Content generator that POSTs prompts to one model endpoint.
pub struct HttpContentGenerator {
    client: Client,
    endpoint: Url,
    api_key: Zeroizing<String>,
}

impl HttpContentGenerator {
    /// Build an adapter with a request timeout applied to every call.
    ///
    /// # Errors
    ///
    /// Returns an error when the model path cannot be joined onto the base
    /// URL or the reqwest client cannot be constructed.
    pub fn new(config: HttpContentGeneratorConfig) -> Result<Self, ContentGenerationError> {
        let endpoint = model_endpoint(&config.base_url, &config.model)?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|error| ContentGenerationError::transport(error.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key,
        })
    }
}

fn model_endpoint(base_url: &Url, model: &str) -> Result<Url, ContentGenerationError> {
    let model = model.trim();
    if model.is_empty() || model.contains('/') {
        return Err(ContentGenerationError::transport(format!(
            "invalid model name '{model}'"
        )));
    }
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(&format!("models/{model}:generateContent"))
        .map_err(|error| ContentGenerationError::transport(error.to_string()))
}

#[async_trait]
impl ContentGenerator for HttpContentGenerator {
    async fn generate(&self, request: &ContentRequest) -> Result<String, ContentGenerationError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .query(&[("key", self.api_key.as_str())])
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&GenerateRequestDto::from_prompt(&request.prompt))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        parse_text(body.as_ref())
    }
}

fn parse_text(body: &[u8]) -> Result<String, ContentGenerationError> {
    let decoded: GenerateResponseDto = serde_json::from_slice(body).map_err(|error| {
        ContentGenerationError::malformed_response(format!("invalid JSON payload: {error}"))
    })?;
    decoded
        .into_text()
        .ok_or_else(|| ContentGenerationError::malformed_response("response contained no text"))
}

fn map_transport_error(error: reqwest::Error) -> ContentGenerationError {
    // The URL carries the API key.
    let error = error.without_url();
    if error.is_timeout() {
        ContentGenerationError::timeout(error.to_string())
    } else {
        ContentGenerationError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ContentGenerationError {
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            ContentGenerationError::timeout(format!("status {}", status.as_u16()))
        }
        _ => ContentGenerationError::status(status.as_u16(), body_preview(body)),
    }
}
