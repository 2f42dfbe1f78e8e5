//! Normalized provider request.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Request sent to any provider adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// System instruction (if supported separately).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// User prompt.
    pub prompt: String,

    /// Temperature for sampling (0.0 - 2.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Stop sequences.
    #[serde(default)]
    pub stop: Vec<String>,

    /// Ask the provider for a JSON-only answer where it supports one.
    #[serde(default)]
    pub json_response: bool,

    /// Model override; the adapter's configured model is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Per-attempt timeout.
    #[serde(skip)]
    pub timeout: Option<Duration>,
}

impl ProviderRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            temperature: None,
            max_tokens: None,
            stop: Vec::new(),
            json_response: false,
            model: None,
            timeout: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_stop(mut self, stop: impl Into<String>) -> Self {
        self.stop.push(stop.into());
        self
    }

    pub fn with_json_response(mut self) -> Self {
        self.json_response = true;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
