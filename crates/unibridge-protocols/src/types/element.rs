//! Element handles and their cached state.

use serde::{Deserialize, Serialize};

use super::{ElementId, Locator, SessionId};

/// Element bounds in the backend's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Last-known text and geometry of an element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rect: Option<Rect>,
}

/// A session-scoped reference to a located element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementHandle {
    pub id: ElementId,
    pub session_id: SessionId,
    pub locator: Locator,
    /// Snapshot taken when the element was located; never refreshed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached: Option<ElementSnapshot>,
}

impl std::fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id, self.locator)
    }
}

/// Backend locator state a handle resolves to.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementState {
    /// Backend-native element reference (WebDriver element id, DOM node id, ...).
    pub backend_ref: String,
    pub locator: Locator,
    /// Cached snapshot, handed out once and cleared by the lookup that returns it.
    pub cached: Option<ElementSnapshot>,
}
