//! # UniBridge Provider - Gemini
//!
//! Google Gemini provider for UniBridge.

mod client;
mod provider;
mod types;

pub use client::DEFAULT_BASE_URL;
pub use provider::{GeminiProvider, DEFAULT_MODEL};
