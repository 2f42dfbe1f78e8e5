//! Element locators.

use serde::{Deserialize, Serialize};

/// How a locator value should be interpreted by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorStrategy {
    Id,
    Xpath,
    Name,
    ClassName,
    AccessibilityId,
    CssSelector,
    TagName,
    LinkText,
    AndroidUiAutomator,
    IosPredicate,
    IosClassChain,
}

impl LocatorStrategy {
    /// Strategy name as used on the WebDriver wire.
    pub fn as_webdriver(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Xpath => "xpath",
            Self::Name => "name",
            Self::ClassName => "class name",
            Self::AccessibilityId => "accessibility id",
            Self::CssSelector => "css selector",
            Self::TagName => "tag name",
            Self::LinkText => "link text",
            Self::AndroidUiAutomator => "-android uiautomator",
            Self::IosPredicate => "-ios predicate string",
            Self::IosClassChain => "-ios class chain",
        }
    }
}

impl std::fmt::Display for LocatorStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_webdriver())
    }
}

impl std::str::FromStr for LocatorStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        match normalized.trim() {
            "id" | "resource id" => Ok(Self::Id),
            "xpath" => Ok(Self::Xpath),
            "name" => Ok(Self::Name),
            "class name" | "class" | "classname" => Ok(Self::ClassName),
            "accessibility id" | "accessibility" | "content desc" => Ok(Self::AccessibilityId),
            "css selector" | "css" => Ok(Self::CssSelector),
            "tag name" | "tag" => Ok(Self::TagName),
            "link text" | "link" => Ok(Self::LinkText),
            "android uiautomator" | "uiautomator" => Ok(Self::AndroidUiAutomator),
            "ios predicate string" | "ios predicate" | "predicate" => Ok(Self::IosPredicate),
            "ios class chain" | "class chain" => Ok(Self::IosClassChain),
            _ => Err(format!("unknown locator strategy: {}", s)),
        }
    }
}

/// A strategy/value pair identifying zero or more elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub strategy: LocatorStrategy,
    pub value: String,
}

impl Locator {
    pub fn new(strategy: LocatorStrategy, value: impl Into<String>) -> Self {
        Self {
            strategy,
            value: value.into(),
        }
    }

    pub fn id(value: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::Id, value)
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::Xpath, value)
    }

    pub fn css(value: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::CssSelector, value)
    }

    pub fn accessibility_id(value: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::AccessibilityId, value)
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.strategy, self.value)
    }
}
