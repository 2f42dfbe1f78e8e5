//! OpenAI provider for UniBridge.

mod api;
mod provider;

pub use provider::{OpenAIProvider, DEFAULT_BASE_URL, DEFAULT_MODEL};
