//! Provider adapter trait.

use async_trait::async_trait;

use super::{ProviderRequest, ProviderResponse};
use crate::error::BridgeError;

/// One AI backend behind the normalized request/response shape.
///
/// `send` fails only with the provider error kinds
/// ([`BridgeError::ProviderConnection`], [`BridgeError::ProviderAuthentication`],
/// [`BridgeError::ProviderQuotaExceeded`], [`BridgeError::ProviderResponse`])
/// or [`BridgeError::Timeout`] when the request timeout elapses.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Returns the provider ID.
    fn id(&self) -> &str;

    /// Returns the configured default model.
    fn model(&self) -> &str;

    /// Send one request.
    async fn send(&self, request: ProviderRequest) -> Result<ProviderResponse, BridgeError>;
}
