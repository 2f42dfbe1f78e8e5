//! Raw backend faults, reported by transports and handlers before classification.

use thiserror::Error;

use super::Cause;

/// What went wrong inside a backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultCode {
    /// The endpoint could not be reached at all.
    Unreachable,
    /// The connection dropped or was closed underneath the call.
    Disconnected,
    /// The backend no longer knows the session.
    InvalidSession,
    /// The locator matched nothing.
    NoSuchElement,
    /// The element reference is detached from the document/view hierarchy.
    StaleElement,
    /// The backend gave up waiting on its own side.
    Timeout,
    /// The backend refused the request (bad arguments, rejected capabilities).
    Rejected,
    /// The backend answered with a payload that does not match its contract.
    Malformed,
    /// The backend does not implement the requested command.
    Unsupported,
}

impl FaultCode {
    /// Faults after which the session can no longer be used.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, Self::Disconnected | Self::InvalidSession)
    }
}

#[derive(Debug, Error)]
#[error("{method} failed ({code:?}): {message}")]
pub struct BackendFault {
    pub code: FaultCode,
    pub method: String,
    pub message: String,
    #[source]
    pub cause: Option<Cause>,
}

impl BackendFault {
    pub fn new(code: FaultCode, method: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            method: method.into(),
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause<E>(mut self, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.cause = Some(Box::new(error));
        self
    }

    pub fn malformed(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(FaultCode::Malformed, method, message)
    }

    pub fn unsupported(method: impl Into<String>) -> Self {
        let method = method.into();
        let message = format!("command '{}' is not supported", method);
        Self::new(FaultCode::Unsupported, method, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_display() {
        let fault = BackendFault::new(FaultCode::NoSuchElement, "findElements", "no match");
        let text = fault.to_string();
        assert!(text.contains("findElements"));
        assert!(text.contains("NoSuchElement"));
        assert!(text.contains("no match"));
    }

    #[test]
    fn test_session_fatal_codes() {
        assert!(FaultCode::Disconnected.is_session_fatal());
        assert!(FaultCode::InvalidSession.is_session_fatal());
        assert!(!FaultCode::StaleElement.is_session_fatal());
        assert!(!FaultCode::Unreachable.is_session_fatal());
    }

    #[test]
    fn test_unsupported_message() {
        let fault = BackendFault::unsupported("Page.print");
        assert_eq!(fault.code, FaultCode::Unsupported);
        assert!(fault.message.contains("Page.print"));
    }
}
