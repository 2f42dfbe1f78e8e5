//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::{Config, KEYLESS_PROVIDERS, KNOWN_PROVIDERS};

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Turn the first error into a [`ConfigError`].
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(ConfigError::InvalidValue {
                field: error.path,
                message: error.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_bridge(config, &mut result);
        Self::validate_endpoints(config, &mut result);
        Self::validate_ai(config, &mut result);
        Self::validate_providers(config, &mut result);

        result
    }

    fn validate_bridge(config: &Config, result: &mut ValidationResult) {
        if config.bridge.command_timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "bridge.command_timeout_ms",
                "command_timeout_ms must be greater than 0",
            ));
        }

        if config.bridge.poll_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "bridge.poll_interval_ms",
                "poll_interval_ms must be greater than 0",
            ));
        } else if config.bridge.poll_interval_ms > config.bridge.command_timeout_ms {
            result.add_warning(ValidationWarning::new(
                "bridge.poll_interval_ms",
                "poll interval is longer than the command timeout; find will poll at most once",
            ));
        }
    }

    fn validate_endpoints(config: &Config, result: &mut ValidationResult) {
        let endpoints = [
            ("mobile.endpoint", &config.mobile.endpoint, config.mobile.request_timeout_ms),
            ("browser.endpoint", &config.browser.endpoint, config.browser.request_timeout_ms),
        ];

        for (path, endpoint, timeout_ms) in endpoints {
            match url::Url::parse(endpoint) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
                Ok(parsed) => result.add_error(ValidationError::new(
                    path,
                    format!("unsupported scheme '{}', expected http or https", parsed.scheme()),
                )),
                Err(e) => result.add_error(ValidationError::new(
                    path,
                    format!("invalid URL '{}': {}", endpoint, e),
                )),
            }

            if timeout_ms == 0 {
                result.add_error(ValidationError::new(
                    path.replace("endpoint", "request_timeout_ms"),
                    "request timeout must be greater than 0",
                ));
            }
        }
    }

    fn validate_ai(config: &Config, result: &mut ValidationResult) {
        let ai = &config.ai;

        if !KNOWN_PROVIDERS.contains(&ai.provider.as_str()) {
            result.add_error(ValidationError::new(
                "ai.provider",
                format!(
                    "Unknown provider '{}', valid values: {:?}",
                    ai.provider, KNOWN_PROVIDERS
                ),
            ));
        }

        if !(0.0..=2.0).contains(&ai.temperature) {
            result.add_warning(ValidationWarning::new(
                "ai.temperature",
                "temperature outside 0.0-2.0 may be rejected by the provider",
            ));
        }

        if ai.max_tokens == 0 {
            result.add_error(ValidationError::new(
                "ai.max_tokens",
                "max_tokens must be greater than 0",
            ));
        }

        if ai.timeout_seconds == 0 {
            result.add_error(ValidationError::new(
                "ai.timeout_seconds",
                "timeout_seconds must be greater than 0",
            ));
        }

        if ai.retry.max_attempts == 0 {
            result.add_error(ValidationError::new(
                "ai.retry.max_attempts",
                "max_attempts must be at least 1",
            ));
        }

        if ai.retry.backoff_factor < 1.0 || !ai.retry.backoff_factor.is_finite() {
            result.add_error(ValidationError::new(
                "ai.retry.backoff_factor",
                "backoff_factor must be a finite number >= 1.0",
            ));
        }

        if ai.retry.max_delay_ms < ai.retry.initial_delay_ms {
            result.add_warning(ValidationWarning::new(
                "ai.retry.max_delay_ms",
                "max_delay_ms is below initial_delay_ms; every retry waits max_delay_ms",
            ));
        }
    }

    fn validate_providers(config: &Config, result: &mut ValidationResult) {
        let selected = config.ai.provider.as_str();
        let needs_key = !KEYLESS_PROVIDERS.contains(&selected);
        let has_key = config
            .providers
            .get(selected)
            .and_then(|p| p.api_key())
            .is_some();

        if needs_key && !has_key {
            result.add_warning(ValidationWarning::new(
                format!("providers.{}.api_key", selected),
                "API key is not set; AI operations will fail with an authentication error",
            ));
        }

        for (name, provider) in &config.providers {
            if let Some(ref url) = provider.base_url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    result.add_error(ValidationError::new(
                        format!("providers.{}.base_url", name),
                        "base_url must start with http:// or https://",
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
