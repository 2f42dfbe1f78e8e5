//! The closed error taxonomy surfaced to callers.

use std::time::Duration;

use thiserror::Error;

/// Boxed underlying cause attached to an error.
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Every failure that crosses a component boundary.
///
/// Backend- and provider-native errors are reclassified into one of these
/// variants at the first boundary that observes them.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        cause: Option<Cause>,
    },

    #[error("Protocol error: {message}")]
    Protocol {
        message: String,
        #[source]
        cause: Option<Cause>,
    },

    #[error("Element not found: {message}")]
    ElementNotFound {
        message: String,
        #[source]
        cause: Option<Cause>,
    },

    #[error("Stale element: {message}")]
    StaleElement {
        message: String,
        #[source]
        cause: Option<Cause>,
    },

    #[error("Provider connection failed: {message}")]
    ProviderConnection {
        message: String,
        #[source]
        cause: Option<Cause>,
    },

    #[error("Provider authentication failed: {message}")]
    ProviderAuthentication {
        message: String,
        #[source]
        cause: Option<Cause>,
    },

    #[error("Provider quota exceeded: {message}")]
    ProviderQuotaExceeded {
        message: String,
        retry_after: Option<Duration>,
        #[source]
        cause: Option<Cause>,
    },

    #[error("Provider response error: {message}")]
    ProviderResponse {
        message: String,
        status: Option<u16>,
        #[source]
        cause: Option<Cause>,
    },

    #[error("Timed out after {elapsed:?}: {message}")]
    Timeout {
        message: String,
        elapsed: Duration,
        #[source]
        cause: Option<Cause>,
    },
}

/// Discriminant of a [`BridgeError`], used for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Transport,
    Protocol,
    ElementNotFound,
    StaleElement,
    ProviderConnection,
    ProviderAuthentication,
    ProviderQuotaExceeded,
    ProviderResponse,
    Timeout,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Protocol => "protocol",
            Self::ElementNotFound => "element_not_found",
            Self::StaleElement => "stale_element",
            Self::ProviderConnection => "provider_connection",
            Self::ProviderAuthentication => "provider_authentication",
            Self::ProviderQuotaExceeded => "provider_quota_exceeded",
            Self::ProviderResponse => "provider_response",
            Self::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BridgeError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            cause: None,
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
            cause: None,
        }
    }

    pub fn element_not_found(message: impl Into<String>) -> Self {
        Self::ElementNotFound {
            message: message.into(),
            cause: None,
        }
    }

    pub fn stale_element(message: impl Into<String>) -> Self {
        Self::StaleElement {
            message: message.into(),
            cause: None,
        }
    }

    pub fn provider_connection(message: impl Into<String>) -> Self {
        Self::ProviderConnection {
            message: message.into(),
            cause: None,
        }
    }

    pub fn provider_authentication(message: impl Into<String>) -> Self {
        Self::ProviderAuthentication {
            message: message.into(),
            cause: None,
        }
    }

    pub fn quota_exceeded(message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self::ProviderQuotaExceeded {
            message: message.into(),
            retry_after,
            cause: None,
        }
    }

    pub fn provider_response(message: impl Into<String>) -> Self {
        Self::ProviderResponse {
            message: message.into(),
            status: None,
            cause: None,
        }
    }

    pub fn timeout(message: impl Into<String>, elapsed: Duration) -> Self {
        Self::Timeout {
            message: message.into(),
            elapsed,
            cause: None,
        }
    }

    /// Attach an underlying cause, replacing any previous one.
    pub fn with_cause<E>(mut self, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        match &mut self {
            Self::Transport { cause, .. }
            | Self::Protocol { cause, .. }
            | Self::ElementNotFound { cause, .. }
            | Self::StaleElement { cause, .. }
            | Self::ProviderConnection { cause, .. }
            | Self::ProviderAuthentication { cause, .. }
            | Self::ProviderQuotaExceeded { cause, .. }
            | Self::ProviderResponse { cause, .. }
            | Self::Timeout { cause, .. } => *cause = Some(Box::new(error)),
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Protocol { .. } => ErrorKind::Protocol,
            Self::ElementNotFound { .. } => ErrorKind::ElementNotFound,
            Self::StaleElement { .. } => ErrorKind::StaleElement,
            Self::ProviderConnection { .. } => ErrorKind::ProviderConnection,
            Self::ProviderAuthentication { .. } => ErrorKind::ProviderAuthentication,
            Self::ProviderQuotaExceeded { .. } => ErrorKind::ProviderQuotaExceeded,
            Self::ProviderResponse { .. } => ErrorKind::ProviderResponse,
            Self::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Transport { message, .. }
            | Self::Protocol { message, .. }
            | Self::ElementNotFound { message, .. }
            | Self::StaleElement { message, .. }
            | Self::ProviderConnection { message, .. }
            | Self::ProviderAuthentication { message, .. }
            | Self::ProviderQuotaExceeded { message, .. }
            | Self::ProviderResponse { message, .. }
            | Self::Timeout { message, .. } => message,
        }
    }

    /// Provider-supplied delay before the next attempt, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::ProviderQuotaExceeded { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// HTTP status carried by a provider response error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ProviderResponse { status, .. } => *status,
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
