//! The unified command value.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Operation;
use crate::types::{ElementHandle, Locator, SessionId};

/// A request to perform one unified operation against a session.
///
/// Commands are immutable once built; dispatch only ever borrows them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub session_id: SessionId,
    pub operation: Operation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementHandle>,
    #[serde(default)]
    pub params: Map<String, Value>,
    /// Per-call timeout; the dispatcher default applies when unset.
    #[serde(skip_serializing_if = "Option::is_none", with = "opt_millis", default)]
    pub timeout: Option<Duration>,
}

impl Command {
    pub fn new(session_id: SessionId, operation: Operation) -> Self {
        Self {
            session_id,
            operation,
            element: None,
            params: Map::new(),
            timeout: None,
        }
    }

    pub fn with_element(mut self, element: ElementHandle) -> Self {
        self.element = Some(element);
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_locator(self, locator: &Locator) -> Self {
        self.with_param("strategy", locator.strategy.as_webdriver())
            .with_param("value", locator.value.clone())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    pub fn param_str(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(|v| v.as_str())
    }

    /// Locator carried in the `strategy`/`value` parameters.
    pub fn locator(&self) -> Option<Locator> {
        let strategy = self.param_str("strategy")?.parse().ok()?;
        let value = self.param_str("value")?;
        Some(Locator::new(strategy, value))
    }
}

mod opt_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}
