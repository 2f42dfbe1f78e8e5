//! Capability sets used to open sessions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of automation backend a session runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Mobile,
    Browser,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Browser => "browser",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mobile" | "appium" => Ok(Self::Mobile),
            "browser" | "web" => Ok(Self::Browser),
            other => Err(format!("unknown backend kind: {}", other)),
        }
    }
}

/// Requested capabilities for a new session.
///
/// Entries are passed to the backend as-is; the backend decides which ones it
/// honours and reports the negotiated set back on the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    pub backend: BackendKind,
    #[serde(default)]
    pub entries: Map<String, Value>,
}

impl Capabilities {
    pub fn new(backend: BackendKind) -> Self {
        Self {
            backend,
            entries: Map::new(),
        }
    }

    pub fn mobile() -> Self {
        Self::new(BackendKind::Mobile)
    }

    pub fn browser() -> Self {
        Self::new(BackendKind::Browser)
    }

    /// Android preset driven by UiAutomator2.
    pub fn android(device_name: impl Into<String>) -> Self {
        Self::mobile()
            .with("platformName", "Android")
            .with("appium:automationName", "UiAutomator2")
            .with("appium:deviceName", device_name.into())
            .with("appium:newCommandTimeout", 300)
    }

    /// iOS preset driven by XCUITest.
    pub fn ios(device_name: impl Into<String>) -> Self {
        Self::mobile()
            .with("platformName", "iOS")
            .with("appium:automationName", "XCUITest")
            .with("appium:deviceName", device_name.into())
            .with("appium:newCommandTimeout", 300)
    }

    /// Set an entry.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(|v| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_android_preset() {
        let caps = Capabilities::android("Pixel_7");
        assert_eq!(caps.backend, BackendKind::Mobile);
        assert_eq!(caps.get_str("platformName"), Some("Android"));
        assert_eq!(caps.get_str("appium:automationName"), Some("UiAutomator2"));
        assert_eq!(caps.get_str("appium:deviceName"), Some("Pixel_7"));
    }

    #[test]
    fn test_ios_preset() {
        let caps = Capabilities::ios("iPhone 15").with("appium:app", "/tmp/app.ipa");
        assert_eq!(caps.get_str("appium:automationName"), Some("XCUITest"));
        assert_eq!(caps.get_str("appium:app"), Some("/tmp/app.ipa"));
    }

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!("Browser".parse::<BackendKind>(), Ok(BackendKind::Browser));
        assert_eq!("appium".parse::<BackendKind>(), Ok(BackendKind::Mobile));
        assert!("desktop".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_capabilities_serde() {
        let caps = Capabilities::browser().with("headless", true);
        let json = serde_json::to_value(&caps).unwrap();
        assert_eq!(json["backend"], "browser");
        assert_eq!(json["entries"]["headless"], true);
    }
}
