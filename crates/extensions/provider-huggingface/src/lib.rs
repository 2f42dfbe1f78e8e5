//! Hugging Face inference provider for UniBridge.

mod api;
mod provider;

pub use provider::{HuggingFaceProvider, DEFAULT_BASE_URL, DEFAULT_MODEL};
