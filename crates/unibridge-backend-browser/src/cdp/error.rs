//! CDP error types.

use thiserror::Error;

use unibridge_protocols::error::{BackendFault, FaultCode};

/// CDP client errors.
#[derive(Debug, Error)]
pub enum CdpError {
    /// Chrome not found or not running with remote debugging.
    #[error("Chrome not available at {0}. Start Chrome with: chrome --remote-debugging-port=9222")]
    ChromeNotAvailable(String),

    /// Failed to open the DevTools WebSocket.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// CDP protocol error.
    #[error("CDP error: {message} (code: {code})")]
    Protocol { code: i64, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Timeout: {0}")]
    Timeout(String),

    /// The WebSocket closed while the request was pending.
    #[error("Session closed")]
    SessionClosed,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

const STALE_MARKERS: &[&str] = &[
    "No node with given id",
    "Could not find node with given id",
    "does not belong to the document",
    "Node is detached",
];

const SESSION_MARKERS: &[&str] = &["Session with given id not found", "No target with given id"];

impl CdpError {
    /// Raw fault code for the bridge.
    pub fn fault_code(&self) -> FaultCode {
        match self {
            Self::ChromeNotAvailable(_) | Self::ConnectionFailed(_) => FaultCode::Unreachable,
            Self::WebSocket(_) | Self::SessionClosed => FaultCode::Disconnected,
            Self::Protocol { code, message } => {
                if STALE_MARKERS.iter().any(|m| message.contains(m)) {
                    FaultCode::StaleElement
                } else if SESSION_MARKERS.iter().any(|m| message.contains(m)) {
                    FaultCode::InvalidSession
                } else if *code == -32601 {
                    FaultCode::Unsupported
                } else {
                    FaultCode::Rejected
                }
            }
            Self::Timeout(_) => FaultCode::Timeout,
            Self::Serialization(_) | Self::InvalidResponse(_) => FaultCode::Malformed,
        }
    }

    pub fn into_fault(self, method: &str) -> BackendFault {
        BackendFault::new(self.fault_code(), method, self.to_string()).with_cause(self)
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for CdpError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        CdpError::WebSocket(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protocol(code: i64, message: &str) -> CdpError {
        CdpError::Protocol {
            code,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_fault_codes() {
        assert_eq!(protocol(-32000, "No node with given id found").fault_code(), FaultCode::StaleElement);
        assert_eq!(protocol(-32001, "Session with given id not found.").fault_code(), FaultCode::InvalidSession);
        assert_eq!(protocol(-32601, "'Foo.bar' wasn't found").fault_code(), FaultCode::Unsupported);
        assert_eq!(protocol(-32602, "Invalid parameters").fault_code(), FaultCode::Rejected);
        assert_eq!(CdpError::SessionClosed.fault_code(), FaultCode::Disconnected);
        assert_eq!(CdpError::ChromeNotAvailable("x".into()).fault_code(), FaultCode::Unreachable);
        assert_eq!(CdpError::Timeout("t".into()).fault_code(), FaultCode::Timeout);
    }

    #[test]
    fn test_into_fault_keeps_method() {
        let fault = protocol(-32000, "Cannot navigate to invalid URL").into_fault("Page.navigate");
        assert_eq!(fault.method, "Page.navigate");
        assert_eq!(fault.code, FaultCode::Rejected);
        assert!(fault.message.contains("invalid URL"));
    }
}
