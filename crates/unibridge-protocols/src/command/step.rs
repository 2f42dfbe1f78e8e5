//! Session-independent steps, as produced by command interpretation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Operation;
use crate::types::Locator;

/// One primitive step of a plan, not yet bound to a session.
///
/// When `locator` is set and the operation needs an element, the session
/// locates the element first and then applies the operation to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedStep {
    pub operation: Operation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locator: Option<Locator>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}

impl PlannedStep {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            locator: None,
            params: Map::new(),
        }
    }

    pub fn with_locator(mut self, locator: Locator) -> Self {
        self.locator = Some(locator);
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}
