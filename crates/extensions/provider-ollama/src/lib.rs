//! Ollama provider for UniBridge.
//!
//! Talks to a local (or self-hosted) Ollama server; no API key involved.

mod api;
mod provider;

pub use provider::{OllamaProvider, DEFAULT_HOST, DEFAULT_MODEL};
