//! Simulated backend, transport and handlers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use unibridge_protocols::backend::{Backend, BackendTransport, CommandHandler, Connection, HandlerCall};
use unibridge_protocols::command::{CommandOutput, ElementRef, Operation};
use unibridge_protocols::error::{BackendFault, FaultCode};
use unibridge_protocols::types::{BackendKind, Capabilities, ElementSnapshot, Rect};

use super::SimulatedScreen;

/// Backend whose sessions all act on one [`SimulatedScreen`].
pub struct SimulatedBackend {
    kind: BackendKind,
    endpoint: String,
    screen: Arc<SimulatedScreen>,
}

impl SimulatedBackend {
    pub fn new(kind: BackendKind, screen: Arc<SimulatedScreen>) -> Self {
        Self {
            kind,
            endpoint: format!("simulated://{}", kind),
            screen,
        }
    }

    pub fn screen(&self) -> &Arc<SimulatedScreen> {
        &self.screen
    }

    /// Operations available for this backend kind.
    ///
    /// Script execution exists only on browser sessions and contexts only
    /// on mobile sessions, as with the real engines.
    fn operations(&self) -> Vec<Operation> {
        Operation::ALL
            .into_iter()
            .filter(|op| match (self.kind, op) {
                (BackendKind::Mobile, Operation::ExecuteScript) => false,
                (BackendKind::Browser, Operation::SwitchContext | Operation::GetContexts) => false,
                _ => true,
            })
            .collect()
    }
}

#[async_trait]
impl Backend for SimulatedBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn connect(&self, capabilities: &Capabilities) -> Result<Connection, BackendFault> {
        self.screen.connect()?;
        let mut negotiated = capabilities.entries.clone();
        negotiated.insert("simulated".to_string(), Value::Bool(true));
        Ok(Connection {
            transport: Arc::new(SimulatedTransport {
                screen: self.screen.clone(),
                open: AtomicBool::new(true),
            }),
            negotiated,
        })
    }

    fn handlers(&self) -> Vec<(Operation, Arc<dyn CommandHandler>)> {
        self.operations()
            .into_iter()
            .map(|op| (op, Arc::new(SimulatedHandler { operation: op }) as Arc<dyn CommandHandler>))
            .collect()
    }
}

/// Transport that forwards calls to the shared screen.
///
/// Closing one transport leaves other sessions on the same screen alone;
/// [`SimulatedScreen::disconnect`] drops all of them.
pub struct SimulatedTransport {
    screen: Arc<SimulatedScreen>,
    open: AtomicBool,
}

#[async_trait]
impl BackendTransport for SimulatedTransport {
    async fn call(&self, method: &str, params: Value) -> Result<Value, BackendFault> {
        if !self.open.load(Ordering::Acquire) {
            return Err(BackendFault::new(
                FaultCode::Disconnected,
                method,
                "simulated session was closed",
            ));
        }
        self.screen.call(method, &params)
    }

    async fn close(&self) -> Result<(), BackendFault> {
        self.open.store(false, Ordering::Release);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.open.load(Ordering::Acquire) && self.screen.is_connected()
    }
}

struct SimulatedHandler {
    operation: Operation,
}

#[async_trait]
impl CommandHandler for SimulatedHandler {
    async fn handle(
        &self,
        transport: &dyn BackendTransport,
        call: HandlerCall<'_>,
    ) -> Result<CommandOutput, BackendFault> {
        let mut params = call.command.params.clone();
        if let Some(element) = call.element {
            params.insert("ref".to_string(), Value::String(element.backend_ref.clone()));
        }

        let method = self.operation.as_str();
        let result = transport.call(method, Value::Object(params)).await?;

        Ok(match self.operation {
            Operation::Find | Operation::FindAll => CommandOutput::Elements(parse_elements(method, result)?),
            Operation::GetText | Operation::PageSource => match result {
                Value::String(text) => CommandOutput::Text(text),
                _ => return Err(BackendFault::malformed(method, "expected a string")),
            },
            Operation::Screenshot => CommandOutput::Image(
                serde_json::from_value(result)
                    .map_err(|e| BackendFault::malformed(method, e.to_string()))?,
            ),
            Operation::GetAttribute | Operation::ExecuteScript | Operation::GetContexts => {
                CommandOutput::Value(result)
            }
            _ => CommandOutput::None,
        })
    }
}

fn parse_elements(method: &str, result: Value) -> Result<Vec<ElementRef>, BackendFault> {
    let Value::Array(items) = result else {
        return Err(BackendFault::malformed(method, "expected an array of elements"));
    };

    items
        .into_iter()
        .map(|item| {
            let backend_ref = item
                .get("ref")
                .and_then(|v| v.as_str())
                .ok_or_else(|| BackendFault::malformed(method, "element without ref"))?;
            let rect: Option<Rect> = item
                .get("rect")
                .and_then(|r| serde_json::from_value(r.clone()).ok());
            let text = item.get("text").and_then(|v| v.as_str()).map(String::from);
            Ok(ElementRef::new(backend_ref).with_snapshot(ElementSnapshot { text, rect }))
        })
        .collect()
}
