//! Hugging Face text-generation provider.

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use tracing::debug;

use unibridge_protocols::error::{classify_provider_status, parse_retry_after, BridgeError};
use unibridge_protocols::provider::{ProviderAdapter, ProviderRequest, ProviderResponse};

use crate::api::{ApiError, GenerationOptions, GenerationParameters, GenerationRequest, GenerationResponse};

pub const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_MODEL: &str = "meta-llama/Llama-2-70b-chat-hf";

const JSON_PRIMER: &str = "\nI'll provide my response as a valid JSON object.\n";

/// Hugging Face inference API provider.
///
/// Chat models are driven through plain text generation, so system and user
/// turns are folded into one tagged prompt.
pub struct HuggingFaceProvider {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl HuggingFaceProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: DEFAULT_MODEL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}", self.base_url, model)
    }

    fn build_prompt(request: &ProviderRequest) -> String {
        let mut prompt = String::new();
        if let Some(system) = &request.system {
            prompt.push_str(&format!("<system>\n{}\n</system>\n\n", system));
        }
        prompt.push_str(&format!("<user>\n{}\n</user>\n\n<assistant>", request.prompt));
        if request.json_response {
            prompt.push_str(JSON_PRIMER);
        }
        prompt
    }

    fn build_request(request: &ProviderRequest) -> GenerationRequest {
        GenerationRequest {
            inputs: Self::build_prompt(request),
            parameters: GenerationParameters {
                max_new_tokens: request.max_tokens,
                temperature: request.temperature,
                stop: request.stop.clone(),
                return_full_text: false,
            },
            options: GenerationOptions {
                wait_for_model: false,
            },
        }
    }

    async fn post(
        &self,
        model: &str,
        request: &ProviderRequest,
        body: &GenerationRequest,
    ) -> Result<serde_json::Value, BridgeError> {
        let mut builder = self
            .client
            .post(self.endpoint(model))
            .bearer_auth(&self.api_key)
            .json(body);
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                BridgeError::timeout("Hugging Face request timed out", request.timeout.unwrap_or_default())
            } else {
                BridgeError::provider_connection(format!("Hugging Face request failed: {}", e)).with_cause(e)
            }
        })?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let text = response.text().await.map_err(|e| {
            BridgeError::provider_connection(format!("Hugging Face response body lost: {}", e)).with_cause(e)
        })?;

        if status.as_u16() == 503 {
            if let Ok(ApiError { error, estimated_time: Some(eta) }) = serde_json::from_str::<ApiError>(&text) {
                return Err(BridgeError::provider_connection(format!(
                    "model {} is loading ({}), ready in ~{:.0}s",
                    model, error, eta
                )));
            }
        }
        if !status.is_success() {
            return Err(classify_provider_status(status.as_u16(), &text, retry_after));
        }

        serde_json::from_str(&text).map_err(|e| {
            BridgeError::provider_response(format!("Hugging Face returned invalid JSON: {}", e)).with_cause(e)
        })
    }
}

#[async_trait]
impl ProviderAdapter for HuggingFaceProvider {
    fn id(&self) -> &str {
        "huggingface"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, request: ProviderRequest) -> Result<ProviderResponse, BridgeError> {
        let model = request.model.clone().unwrap_or_else(|| self.model.clone());
        let body = Self::build_request(&request);
        debug!("Hugging Face text generation: model={}", model);

        let raw = self.post(&model, &request, &body).await?;
        let parsed: GenerationResponse = serde_json::from_value(raw.clone()).map_err(|e| {
            BridgeError::provider_response(format!("unexpected Hugging Face response shape: {}", e)).with_cause(e)
        })?;
        let text = parsed
            .into_text()
            .ok_or_else(|| BridgeError::provider_response("Hugging Face response has no generated_text"))?;

        Ok(ProviderResponse::new(text.trim(), model).with_raw(raw))
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
