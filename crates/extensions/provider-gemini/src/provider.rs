//! Gemini provider implementation.

use async_trait::async_trait;

use unibridge_protocols::error::BridgeError;
use unibridge_protocols::provider::{ProviderAdapter, ProviderRequest, ProviderResponse, Usage};

use crate::client::{GeminiClient, DEFAULT_BASE_URL};
use crate::types::*;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Gemini provider.
pub struct GeminiProvider {
    client: GeminiClient,
    model: String,
}

impl GeminiProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        Self {
            client: GeminiClient::new(api_key, base_url),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn build_request(&self, request: &ProviderRequest) -> GenerateContentRequest {
        let generation_config = GenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_tokens,
            stop_sequences: request.stop.clone(),
            response_mime_type: request
                .json_response
                .then(|| "application/json".to_string()),
        };

        GenerateContentRequest {
            contents: vec![Content::text(Some("user"), request.prompt.as_str())],
            system_instruction: request
                .system
                .as_deref()
                .map(|system| Content::text(None, system)),
            generation_config: Some(generation_config),
        }
    }

    fn convert_response(
        response: GenerateContentResponse,
        raw: serde_json::Value,
        model: &str,
    ) -> Result<ProviderResponse, BridgeError> {
        let Some(candidate) = response.candidates.into_iter().next() else {
            let reason = response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(BridgeError::provider_response(format!(
                "Gemini produced no answer: {}",
                reason
            )));
        };

        let text: String = candidate
            .content
            .map(|content| content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(BridgeError::provider_response(format!(
                "Gemini answer has no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        let mut normalized =
            ProviderResponse::new(text, response.model_version.unwrap_or_else(|| model.to_string()));
        if let Some(usage) = response.usage_metadata {
            normalized = normalized.with_usage(Usage {
                prompt_tokens: usage.prompt_token_count,
                completion_tokens: usage.candidates_token_count,
                total_tokens: usage.total_token_count,
            });
        }
        Ok(normalized.with_raw(raw))
    }
}

#[async_trait]
impl ProviderAdapter for GeminiProvider {
    fn id(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, request: ProviderRequest) -> Result<ProviderResponse, BridgeError> {
        let model = request.model.clone().unwrap_or_else(|| self.model.clone());
        let body = self.build_request(&request);
        let (response, raw) = self
            .client
            .generate_content(&model, &body, request.timeout)
            .await?;
        Self::convert_response(response, raw, &model)
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
