//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

mod schema_ai;

pub use schema_ai::*;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bridge: BridgeSettings,

    #[serde(default)]
    pub mobile: MobileConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Command dispatch settings shared by all sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeSettings {
    /// Default per-command timeout.
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,

    /// Interval between locator polls in `find`.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl BridgeSettings {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            command_timeout_ms: default_command_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_command_timeout_ms() -> u64 {
    30_000
}

fn default_poll_interval_ms() -> u64 {
    500
}

/// Mobile automation server (Appium / W3C WebDriver).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MobileConfig {
    #[serde(default = "default_mobile_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl MobileConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for MobileConfig {
    fn default() -> Self {
        Self {
            endpoint: default_mobile_endpoint(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_mobile_endpoint() -> String {
    "http://localhost:4723".to_string()
}

/// Browser DevTools endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_browser_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl BrowserConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            endpoint: default_browser_endpoint(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_browser_endpoint() -> String {
    "http://localhost:9222".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

/// Logging output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily-rotated log files; console only when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
