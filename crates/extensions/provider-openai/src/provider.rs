//! OpenAI provider implementation.

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use tracing::debug;

use unibridge_protocols::error::{classify_provider_status, parse_retry_after, BridgeError};
use unibridge_protocols::provider::{ProviderAdapter, ProviderRequest, ProviderResponse, Usage};

use crate::api::{ApiMessage, ApiRequest, ApiResponse, ResponseFormat};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// OpenAI chat completions provider.
pub struct OpenAIProvider {
    api_key: String,
    api_url: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAIProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create provider with a custom base URL (for OpenAI-compatible APIs).
    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        Self {
            api_key,
            api_url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: DEFAULT_MODEL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn build_request(&self, request: &ProviderRequest) -> ApiRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ApiMessage::new("system", system.as_str()));
        }
        messages.push(ApiMessage::new("user", request.prompt.as_str()));

        ApiRequest {
            model: request.model.clone().unwrap_or_else(|| self.model.clone()),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stop: request.stop.clone(),
            response_format: request.json_response.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        }
    }

    async fn post(&self, request: &ProviderRequest, body: &ApiRequest) -> Result<serde_json::Value, BridgeError> {
        let mut builder = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(body);
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                BridgeError::timeout("OpenAI request timed out", request.timeout.unwrap_or_default())
            } else {
                BridgeError::provider_connection(format!("OpenAI request failed: {}", e)).with_cause(e)
            }
        })?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let text = response.text().await.map_err(|e| {
            BridgeError::provider_connection(format!("OpenAI response body lost: {}", e)).with_cause(e)
        })?;

        if !status.is_success() {
            return Err(classify_provider_status(status.as_u16(), &text, retry_after));
        }

        serde_json::from_str(&text).map_err(|e| {
            BridgeError::provider_response(format!("OpenAI returned invalid JSON: {}", e)).with_cause(e)
        })
    }
}

fn parse_response(raw: serde_json::Value, requested_model: &str) -> Result<ProviderResponse, BridgeError> {
    let api: ApiResponse = serde_json::from_value(raw.clone()).map_err(|e| {
        BridgeError::provider_response(format!("unexpected OpenAI response shape: {}", e)).with_cause(e)
    })?;

    let choice = api
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| BridgeError::provider_response("OpenAI response has no choices"))?;
    let text = choice
        .message
        .content
        .ok_or_else(|| BridgeError::provider_response("OpenAI response has no message content"))?;

    let mut response = ProviderResponse::new(text, api.model.unwrap_or_else(|| requested_model.to_string()));
    if let Some(usage) = api.usage {
        let mut normalized = Usage::new(usage.prompt_tokens, usage.completion_tokens);
        normalized.total_tokens = usage.total_tokens;
        response = response.with_usage(normalized);
    }
    Ok(response.with_raw(raw))
}

#[async_trait]
impl ProviderAdapter for OpenAIProvider {
    fn id(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, request: ProviderRequest) -> Result<ProviderResponse, BridgeError> {
        let body = self.build_request(&request);
        debug!("OpenAI chat completion: model={}", body.model);
        let raw = self.post(&request, &body).await?;
        parse_response(raw, &body.model)
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
