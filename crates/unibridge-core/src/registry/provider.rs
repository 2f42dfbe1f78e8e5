//! Provider registry for managing AI provider adapters.

use dashmap::DashMap;
use std::sync::Arc;

use unibridge_protocols::error::BridgeError;
use unibridge_protocols::provider::ProviderAdapter;

/// Registry of configured provider adapters, keyed by provider id.
pub struct ProviderRegistry {
    providers: DashMap<String, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    /// Create a new provider registry.
    pub fn new() -> Self {
        Self {
            providers: DashMap::new(),
        }
    }

    /// Register a provider.
    pub fn register(&self, provider: Arc<dyn ProviderAdapter>) -> Result<(), BridgeError> {
        let id = provider.id().to_string();

        if self.providers.contains_key(&id) {
            return Err(BridgeError::protocol(format!(
                "provider '{}' is already registered",
                id
            )));
        }

        self.providers.insert(id, provider);
        Ok(())
    }

    /// Get a provider by ID.
    pub fn get(&self, id: &str) -> Option<Arc<dyn ProviderAdapter>> {
        self.providers.get(id).map(|p| p.clone())
    }

    /// List all provider IDs.
    pub fn list_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.providers.iter().map(|p| p.key().clone()).collect();
        ids.sort();
        ids
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
