//! Backend, transport and handler traits.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::command::{Command, CommandOutput, Operation};
use crate::error::BackendFault;
use crate::types::{BackendKind, Capabilities, ElementState};

/// A live connection produced by [`Backend::connect`].
pub struct Connection {
    pub transport: Arc<dyn BackendTransport>,
    /// Capabilities the backend actually granted.
    pub negotiated: Map<String, Value>,
}

/// An automation engine sessions can be opened against.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Which backend kind this implementation serves.
    fn kind(&self) -> BackendKind;

    /// Endpoint the backend connects to.
    fn endpoint(&self) -> &str;

    /// Open a new session-scoped connection.
    ///
    /// Fails with [`FaultCode::Unreachable`](crate::error::FaultCode::Unreachable)
    /// when the endpoint cannot be reached and
    /// [`FaultCode::Rejected`](crate::error::FaultCode::Rejected) when the
    /// capabilities are refused.
    async fn connect(&self, capabilities: &Capabilities) -> Result<Connection, BackendFault>;

    /// Handlers for the operations this backend supports.
    fn handlers(&self) -> Vec<(Operation, Arc<dyn CommandHandler>)>;
}

/// Request/response channel to one backend session.
#[async_trait]
pub trait BackendTransport: Send + Sync {
    /// Invoke a backend-native method.
    async fn call(&self, method: &str, params: Value) -> Result<Value, BackendFault>;

    /// Release backend resources held by this session.
    async fn close(&self) -> Result<(), BackendFault>;

    /// Whether the underlying connection is still usable.
    fn is_connected(&self) -> bool;
}

/// Arguments handed to a [`CommandHandler`].
pub struct HandlerCall<'a> {
    pub command: &'a Command,
    /// Resolved state of the command's target element, if it has one.
    pub element: Option<&'a ElementState>,
}

impl<'a> HandlerCall<'a> {
    pub fn new(command: &'a Command, element: Option<&'a ElementState>) -> Self {
        Self { command, element }
    }

    /// Backend reference of the target element.
    pub fn element_ref(&self) -> Result<&'a str, BackendFault> {
        self.element.map(|e| e.backend_ref.as_str()).ok_or_else(|| {
            BackendFault::malformed(
                self.command.operation.as_str(),
                "operation requires a target element",
            )
        })
    }

    /// Required string parameter.
    pub fn require_str(&self, name: &str) -> Result<&'a str, BackendFault> {
        self.command.param_str(name).ok_or_else(|| {
            BackendFault::new(
                crate::error::FaultCode::Rejected,
                self.command.operation.as_str(),
                format!("missing string parameter '{}'", name),
            )
        })
    }
}

/// Executes one unified operation against a backend transport.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(
        &self,
        transport: &dyn BackendTransport,
        call: HandlerCall<'_>,
    ) -> Result<CommandOutput, BackendFault>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FaultCode;
    use crate::types::{Locator, SessionId};

    #[test]
    fn test_element_ref_missing() {
        let cmd = Command::new(SessionId::new(), Operation::Click);
        let call = HandlerCall::new(&cmd, None);
        let fault = call.element_ref().unwrap_err();
        assert_eq!(fault.code, FaultCode::Malformed);
    }

    #[test]
    fn test_element_ref_present() {
        let cmd = Command::new(SessionId::new(), Operation::Click);
        let state = ElementState {
            backend_ref: "node-9".into(),
            locator: Locator::css("#go"),
            cached: None,
        };
        let call = HandlerCall::new(&cmd, Some(&state));
        assert_eq!(call.element_ref().unwrap(), "node-9");
    }

    #[test]
    fn test_require_str() {
        let cmd = Command::new(SessionId::new(), Operation::Navigate).with_param("url", "https://a.b");
        let call = HandlerCall::new(&cmd, None);
        assert_eq!(call.require_str("url").unwrap(), "https://a.b");
        assert_eq!(call.require_str("nope").unwrap_err().code, FaultCode::Rejected);
    }
}
