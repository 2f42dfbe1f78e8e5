//! Unified operation names.

use serde::{Deserialize, Serialize};

/// One unified operation a session can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Navigate,
    Find,
    FindAll,
    Click,
    Type,
    Clear,
    GetText,
    GetAttribute,
    ExecuteScript,
    Screenshot,
    SwitchContext,
    GetContexts,
    PageSource,
    Back,
}

impl Operation {
    pub const ALL: [Operation; 14] = [
        Self::Navigate,
        Self::Find,
        Self::FindAll,
        Self::Click,
        Self::Type,
        Self::Clear,
        Self::GetText,
        Self::GetAttribute,
        Self::ExecuteScript,
        Self::Screenshot,
        Self::SwitchContext,
        Self::GetContexts,
        Self::PageSource,
        Self::Back,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Navigate => "navigate",
            Self::Find => "find",
            Self::FindAll => "find_all",
            Self::Click => "click",
            Self::Type => "type",
            Self::Clear => "clear",
            Self::GetText => "get_text",
            Self::GetAttribute => "get_attribute",
            Self::ExecuteScript => "execute_script",
            Self::Screenshot => "screenshot",
            Self::SwitchContext => "switch_context",
            Self::GetContexts => "get_contexts",
            Self::PageSource => "page_source",
            Self::Back => "back",
        }
    }

    /// Operations that act on a previously located element.
    pub fn requires_element(&self) -> bool {
        matches!(
            self,
            Self::Click | Self::Type | Self::Clear | Self::GetText | Self::GetAttribute
        )
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| format!("unknown operation: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_matches_as_str() {
        for op in Operation::ALL {
            assert_eq!(op.as_str().parse::<Operation>(), Ok(op));
        }
        assert!("tap".parse::<Operation>().is_err());
    }

    #[test]
    fn test_requires_element() {
        assert!(Operation::Click.requires_element());
        assert!(Operation::GetAttribute.requires_element());
        assert!(!Operation::Find.requires_element());
        assert!(!Operation::Screenshot.requires_element());
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&Operation::ExecuteScript).unwrap();
        assert_eq!(json, "\"execute_script\"");
    }
}
