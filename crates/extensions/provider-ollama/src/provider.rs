//! Ollama chat provider.

use async_trait::async_trait;
use tracing::debug;

use unibridge_protocols::error::{classify_provider_status, BridgeError};
use unibridge_protocols::provider::{ProviderAdapter, ProviderRequest, ProviderResponse, Usage};

use crate::api::{ChatMessage, ChatOptions, ChatRequest, ChatResponse};

pub const DEFAULT_HOST: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "mistral:7b-instruct";

/// Ollama chat provider.
pub struct OllamaProvider {
    api_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new() -> Self {
        Self::with_host(DEFAULT_HOST)
    }

    pub fn with_host(host: &str) -> Self {
        Self {
            api_url: format!("{}/api/chat", host.trim_end_matches('/')),
            model: DEFAULT_MODEL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn build_request(&self, request: &ProviderRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage::new("system", system.as_str()));
        }
        messages.push(ChatMessage::new("user", request.prompt.as_str()));

        ChatRequest {
            model: request.model.clone().unwrap_or_else(|| self.model.clone()),
            messages,
            stream: false,
            format: request.json_response.then(|| "json".to_string()),
            options: ChatOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
                stop: request.stop.clone(),
            },
        }
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_response(raw: serde_json::Value, requested_model: &str) -> Result<ProviderResponse, BridgeError> {
    let chat: ChatResponse = serde_json::from_value(raw.clone()).map_err(|e| {
        BridgeError::provider_response(format!("unexpected Ollama response shape: {}", e)).with_cause(e)
    })?;
    let text = chat
        .message
        .map(|m| m.content)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| BridgeError::provider_response("Ollama response has no message content"))?;

    let mut response = ProviderResponse::new(text, chat.model.unwrap_or_else(|| requested_model.to_string()));
    if let (Some(prompt), Some(completion)) = (chat.prompt_eval_count, chat.eval_count) {
        response = response.with_usage(Usage::new(prompt, completion));
    }
    Ok(response.with_raw(raw))
}

#[async_trait]
impl ProviderAdapter for OllamaProvider {
    fn id(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, request: ProviderRequest) -> Result<ProviderResponse, BridgeError> {
        let body = self.build_request(&request);
        debug!("Ollama chat: model={}", body.model);

        let mut builder = self.client.post(&self.api_url).json(&body);
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                BridgeError::timeout("Ollama request timed out", request.timeout.unwrap_or_default())
            } else {
                BridgeError::provider_connection(format!(
                    "cannot reach Ollama at {}: {}",
                    self.api_url, e
                ))
                .with_cause(e)
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            BridgeError::provider_connection(format!("Ollama response body lost: {}", e)).with_cause(e)
        })?;

        if status.as_u16() == 404 {
            // Ollama answers 404 when the model has not been pulled.
            return Err(BridgeError::provider_response(format!(
                "model {} is not available on the Ollama server (run `ollama pull {}`)",
                body.model, body.model
            )));
        }
        if !status.is_success() {
            return Err(classify_provider_status(status.as_u16(), &text, None));
        }

        let raw: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
            BridgeError::provider_response(format!("Ollama returned invalid JSON: {}", e)).with_cause(e)
        })?;
        parse_response(raw, &body.model)
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
