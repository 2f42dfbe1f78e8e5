//! Registries for element handles, backends and providers.

mod backend;
mod element;
mod provider;

pub use backend::BackendRegistry;
pub use element::ElementRegistry;
pub use provider::ProviderRegistry;
