//! Handler lookup table.

use std::collections::HashMap;
use std::sync::Arc;

use unibridge_protocols::backend::CommandHandler;
use unibridge_protocols::command::Operation;
use unibridge_protocols::types::BackendKind;

/// Handlers keyed by backend kind and operation.
#[derive(Default, Clone)]
pub struct HandlerTable {
    handlers: HashMap<(BackendKind, Operation), Arc<dyn CommandHandler>>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one for the same key.
    pub fn register(
        &mut self,
        kind: BackendKind,
        operation: Operation,
        handler: Arc<dyn CommandHandler>,
    ) {
        self.handlers.insert((kind, operation), handler);
    }

    pub fn get(&self, kind: BackendKind, operation: Operation) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.get(&(kind, operation)).cloned()
    }

    pub fn supports(&self, kind: BackendKind, operation: Operation) -> bool {
        self.handlers.contains_key(&(kind, operation))
    }

    /// Operations registered for a backend kind.
    pub fn operations(&self, kind: BackendKind) -> Vec<Operation> {
        Operation::ALL
            .into_iter()
            .filter(|op| self.supports(kind, *op))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
