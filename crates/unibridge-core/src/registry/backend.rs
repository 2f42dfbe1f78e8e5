//! Registry of backends keyed by backend kind.

use dashmap::DashMap;
use std::sync::Arc;

use unibridge_protocols::backend::Backend;
use unibridge_protocols::error::BridgeError;
use unibridge_protocols::types::BackendKind;

/// Registry for the backend serving each session kind.
pub struct BackendRegistry {
    backends: DashMap<BackendKind, Arc<dyn Backend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: DashMap::new(),
        }
    }

    /// Register a backend. Only one backend may serve each kind.
    pub fn register(&self, backend: Arc<dyn Backend>) -> Result<(), BridgeError> {
        let kind = backend.kind();
        if self.backends.contains_key(&kind) {
            return Err(BridgeError::protocol(format!(
                "a {} backend is already registered",
                kind
            )));
        }
        self.backends.insert(kind, backend);
        Ok(())
    }

    pub fn get(&self, kind: BackendKind) -> Option<Arc<dyn Backend>> {
        self.backends.get(&kind).map(|b| b.clone())
    }

    pub fn kinds(&self) -> Vec<BackendKind> {
        self.backends.iter().map(|b| *b.key()).collect()
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
