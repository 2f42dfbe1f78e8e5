//! Text-generation wire types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct GenerationRequest {
    pub inputs: String,
    pub parameters: GenerationParameters,
    pub options: GenerationOptions,
}

#[derive(Debug, Serialize)]
pub struct GenerationParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_new_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
    pub return_full_text: bool,
}

#[derive(Debug, Serialize)]
pub struct GenerationOptions {
    /// Fail fast with 503 while a cold model loads instead of holding the
    /// connection open.
    pub wait_for_model: bool,
}

#[derive(Debug, Deserialize)]
pub struct Generation {
    #[serde(default)]
    pub generated_text: Option<String>,
}

/// The endpoint answers either a list of generations or a single one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum GenerationResponse {
    Many(Vec<Generation>),
    One(Generation),
}

impl GenerationResponse {
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Many(items) => items.into_iter().next()?.generated_text,
            Self::One(item) => item.generated_text,
        }
    }
}

/// Error body, e.g. `{"error": "Model is currently loading", "estimated_time": 20.0}`.
#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub estimated_time: Option<f64>,
}
