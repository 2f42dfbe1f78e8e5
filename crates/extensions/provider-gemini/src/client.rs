//! Gemini API client.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::RETRY_AFTER;
use tracing::debug;

use unibridge_protocols::error::{classify_provider_status, parse_retry_after, BridgeError};

use crate::types::*;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini API client.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    /// Generate content (non-streaming). Returns the parsed response and the raw payload.
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
        timeout: Option<Duration>,
    ) -> Result<(GenerateContentResponse, serde_json::Value), BridgeError> {
        debug!("Gemini generate_content: model={}", model);

        let mut builder = self
            .client
            .post(self.endpoint(model))
            .query(&[("key", self.api_key.as_str())])
            .json(request);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                BridgeError::timeout("Gemini request timed out", timeout.unwrap_or_default())
            } else {
                // Strip the URL: it carries the API key.
                let e = e.without_url();
                BridgeError::provider_connection(format!("Gemini request failed: {}", e)).with_cause(e)
            }
        })?;

        let status = response.status();
        let header_hint = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let body = response.text().await.map_err(|e| {
            let e = e.without_url();
            BridgeError::provider_connection(format!("Gemini response body lost: {}", e)).with_cause(e)
        })?;

        if !status.is_success() {
            return Err(classify_error(status.as_u16(), &body, header_hint));
        }

        let raw: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            BridgeError::provider_response(format!("Gemini returned invalid JSON: {}", e)).with_cause(e)
        })?;
        let parsed = serde_json::from_value(raw.clone()).map_err(|e| {
            BridgeError::provider_response(format!("unexpected Gemini response shape: {}", e)).with_cause(e)
        })?;
        Ok((parsed, raw))
    }
}

fn classify_error(status: u16, body: &str, header_hint: Option<Duration>) -> BridgeError {
    match serde_json::from_str::<GeminiError>(body) {
        Ok(error) if error.error.is_invalid_key() => {
            BridgeError::provider_authentication(error.error.message)
        }
        Ok(error) => {
            let hint = error
                .error
                .retry_delay()
                .and_then(parse_retry_after)
                .or(header_hint);
            classify_provider_status(status, body, hint)
        }
        Err(_) => classify_provider_status(status, body, header_hint),
    }
}
