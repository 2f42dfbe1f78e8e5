//! Handler outputs and unified command results.

use serde_json::Value;

use crate::error::BridgeError;
use crate::types::{ElementHandle, ElementSnapshot};

/// An element as reported by a backend, before it is registered.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementRef {
    pub backend_ref: String,
    pub snapshot: Option<ElementSnapshot>,
}

impl ElementRef {
    pub fn new(backend_ref: impl Into<String>) -> Self {
        Self {
            backend_ref: backend_ref.into(),
            snapshot: None,
        }
    }

    pub fn with_snapshot(mut self, snapshot: ElementSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }
}

/// Raw output of a command handler.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    None,
    Value(Value),
    Text(String),
    Image(Vec<u8>),
    Elements(Vec<ElementRef>),
}

/// Unified result of a dispatched command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    Done,
    Value(Value),
    Text(String),
    Image(Vec<u8>),
    Elements(Vec<ElementHandle>),
}

impl CommandResult {
    fn shape(&self) -> &'static str {
        match self {
            Self::Done => "nothing",
            Self::Value(_) => "a value",
            Self::Text(_) => "text",
            Self::Image(_) => "an image",
            Self::Elements(_) => "elements",
        }
    }

    pub fn into_text(self) -> Result<String, BridgeError> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Value(Value::String(text)) => Ok(text),
            other => Err(BridgeError::protocol(format!(
                "expected text, backend returned {}",
                other.shape()
            ))),
        }
    }

    pub fn into_value(self) -> Result<Value, BridgeError> {
        match self {
            Self::Value(value) => Ok(value),
            Self::Text(text) => Ok(Value::String(text)),
            Self::Done => Ok(Value::Null),
            other => Err(BridgeError::protocol(format!(
                "expected a value, backend returned {}",
                other.shape()
            ))),
        }
    }

    pub fn into_image(self) -> Result<Vec<u8>, BridgeError> {
        match self {
            Self::Image(bytes) => Ok(bytes),
            other => Err(BridgeError::protocol(format!(
                "expected an image, backend returned {}",
                other.shape()
            ))),
        }
    }

    pub fn into_elements(self) -> Result<Vec<ElementHandle>, BridgeError> {
        match self {
            Self::Elements(handles) => Ok(handles),
            other => Err(BridgeError::protocol(format!(
                "expected elements, backend returned {}",
                other.shape()
            ))),
        }
    }
}
