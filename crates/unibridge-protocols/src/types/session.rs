//! Session descriptors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{BackendKind, Capabilities, SessionId};

/// Lifecycle state of a session: `Created -> Active -> Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Created,
    Active,
    Terminated,
}

/// Immutable description of an open session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: SessionId,
    pub kind: BackendKind,
    pub endpoint: String,
    pub requested: Capabilities,
    pub negotiated: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}
