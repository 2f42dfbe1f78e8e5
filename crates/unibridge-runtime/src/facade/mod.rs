//! AI integration facade.
//!
//! Task-level operations built on a provider adapter: each one builds a
//! prompt, sends it through the retry governor, and parses the answer into a
//! structured result.

pub mod parse;
pub mod prompts;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info_span, Instrument};

use unibridge_config::AiConfig;
use unibridge_protocols::command::PlannedStep;
use unibridge_protocols::error::BridgeError;
use unibridge_protocols::provider::{ProviderAdapter, ProviderRequest};

use crate::retry::{RetryPolicy, RetryProvider};

pub use prompts::ScriptLanguage;

/// What the caller knows about the current screen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreenContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_info: Option<String>,
    #[serde(default)]
    pub has_screenshot: bool,
}

/// Result of `analyze_app_structure`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppStructure {
    #[serde(default)]
    pub app_type: String,
    #[serde(default)]
    pub screens: Vec<ScreenSummary>,
    #[serde(default)]
    pub flows: Vec<FlowSummary>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenSummary {
    pub name: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub key_elements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSummary {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub screens: Vec<String>,
}

/// Result of `generate_test_script`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedScript {
    pub language: ScriptLanguage,
    pub code: String,
}

impl GeneratedScript {
    /// Suggested file name for the script.
    pub fn file_name(&self, stem: &str) -> String {
        format!("{}.{}", stem, self.language.extension())
    }
}

/// Generation parameters applied to every facade request.
#[derive(Debug, Clone)]
pub struct FacadeSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for FacadeSettings {
    fn default() -> Self {
        Self::from_config(&AiConfig::default())
    }
}

impl FacadeSettings {
    pub fn from_config(config: &AiConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: config.timeout(),
        }
    }
}

/// Task-level AI operations over one provider.
pub struct AiFacade {
    provider: RetryProvider,
    settings: FacadeSettings,
}

impl AiFacade {
    pub fn new(adapter: Arc<dyn ProviderAdapter>, policy: RetryPolicy, settings: FacadeSettings) -> Self {
        let provider = RetryProvider::new(adapter, policy, settings.timeout);
        Self { provider, settings }
    }

    pub fn from_config(adapter: Arc<dyn ProviderAdapter>, config: &AiConfig) -> Self {
        Self::new(
            adapter,
            RetryPolicy::from_settings(&config.retry),
            FacadeSettings::from_config(config),
        )
    }

    pub fn provider_id(&self) -> &str {
        self.provider.id()
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    async fn complete(
        &self,
        task: &'static str,
        system: &str,
        prompt: String,
        json: bool,
    ) -> Result<String, BridgeError> {
        let mut request = ProviderRequest::new(prompt)
            .with_system(system)
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens)
            .with_timeout(self.settings.timeout);
        if json {
            request = request.with_json_response();
        }

        let span = info_span!("ai_task", task, provider = self.provider.id());
        let response = self.provider.send(request).instrument(span).await?;
        debug!(task, chars = response.text.len(), "Provider answered");
        Ok(response.text)
    }

    /// Turn a natural-language command into primitive steps.
    pub async fn interpret_command(
        &self,
        command: &str,
        context: &ScreenContext,
    ) -> Result<Vec<PlannedStep>, BridgeError> {
        require_input("command", command)?;
        let text = self
            .complete(
                "interpret_command",
                prompts::INTERPRET_SYSTEM,
                prompts::interpret_prompt(command, context),
                true,
            )
            .await?;
        parse::parse_steps(&text)
    }

    pub async fn describe_screen(&self, page_source: &str) -> Result<String, BridgeError> {
        require_input("page source", page_source)?;
        let text = self
            .complete(
                "describe_screen",
                prompts::DESCRIBE_SYSTEM,
                prompts::describe_prompt(page_source),
                false,
            )
            .await?;

        let description = text.trim();
        if description.is_empty() {
            return Err(BridgeError::provider_response("provider returned an empty description"));
        }
        Ok(description.to_string())
    }

    pub async fn suggest_test_actions(&self, page_source: &str) -> Result<Vec<String>, BridgeError> {
        require_input("page source", page_source)?;
        let text = self
            .complete(
                "suggest_test_actions",
                prompts::SUGGEST_SYSTEM,
                prompts::suggest_prompt(page_source),
                true,
            )
            .await?;
        parse::parse_suggestions(&text)
    }

    /// Analyze up to five screens of one app.
    pub async fn analyze_app_structure(&self, page_sources: &[String]) -> Result<AppStructure, BridgeError> {
        if page_sources.iter().all(|source| source.trim().is_empty()) {
            return Err(BridgeError::protocol("no page sources provided for analysis"));
        }
        let text = self
            .complete(
                "analyze_app_structure",
                prompts::ANALYZE_SYSTEM,
                prompts::analyze_prompt(page_sources),
                true,
            )
            .await?;
        parse::parse_structure(&text)
    }

    pub async fn generate_test_script(
        &self,
        app_info: &serde_json::Value,
        goal: &str,
        language: ScriptLanguage,
    ) -> Result<GeneratedScript, BridgeError> {
        require_input("test goal", goal)?;
        if app_info.is_null() {
            return Err(BridgeError::protocol("app information is required to generate a script"));
        }
        let text = self
            .complete(
                "generate_test_script",
                &language.system_prompt(),
                prompts::script_prompt(language, goal, app_info),
                false,
            )
            .await?;

        Ok(GeneratedScript {
            language,
            code: parse::extract_script(&text, language)?,
        })
    }
}

/// Empty task input is a caller error, rejected before contacting the provider.
fn require_input(what: &str, value: &str) -> Result<(), BridgeError> {
    if value.trim().is_empty() {
        return Err(BridgeError::protocol(format!("{} cannot be empty", what)));
    }
    Ok(())
}

#[cfg(test)]
#[path = "facade_tests.rs"]
mod tests;
