//! Configuration loader.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::ConfigError;
use crate::schema::Config;

/// Configuration loader with environment variable substitution.
///
/// `${VAR}` is replaced by the value of `VAR` and fails when it is unset;
/// `${VAR:-fallback}` uses `fallback` instead.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load from `path` when it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Expand environment variables in the format `${VAR}` / `${VAR:-default}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;

        let mut result = String::with_capacity(content.len());
        let mut last = 0;
        for cap in re.captures_iter(content) {
            let Some(whole) = cap.get(0) else { continue };
            let var_name = &cap[1];
            let value = match (std::env::var(var_name), cap.get(2)) {
                (Ok(value), _) => value,
                (Err(_), Some(fallback)) => fallback.as_str().to_string(),
                (Err(_), None) => return Err(ConfigError::EnvVarNotSet(var_name.to_string())),
            };
            result.push_str(&content[last..whole.start()]);
            result.push_str(&value);
            last = whole.end();
        }
        result.push_str(&content[last..]);

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.config`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }

    /// Per-user configuration file location (`<config dir>/unibridge/config.toml`).
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("unibridge").join("config.toml"))
    }
}
