//! The dispatch boundary.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::time::Instant;
use tracing::{debug, debug_span, warn, Instrument};

use unibridge_protocols::backend::HandlerCall;
use unibridge_protocols::command::{Command, CommandOutput, CommandResult, Operation};
use unibridge_protocols::error::{BackendFault, BridgeError, FaultCode};
use unibridge_protocols::types::{ElementState, SessionState};

use super::{HandlerTable, classify_fault};
use crate::registry::ElementRegistry;
use crate::session::SessionLink;

/// Routes unified commands to backend handlers.
pub struct Dispatcher {
    table: HandlerTable,
    registry: Arc<ElementRegistry>,
    default_timeout: Duration,
}

impl Dispatcher {
    pub fn new(table: HandlerTable, registry: Arc<ElementRegistry>, default_timeout: Duration) -> Self {
        Self {
            table,
            registry,
            default_timeout,
        }
    }

    pub fn table(&self) -> &HandlerTable {
        &self.table
    }

    pub fn registry(&self) -> &Arc<ElementRegistry> {
        &self.registry
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Dispatch one command against a live session.
    ///
    /// Elements returned by the handler are registered only after the handler
    /// finished within its timeout, so an abandoned call never touches the
    /// registry.
    pub async fn dispatch(
        &self,
        link: &SessionLink,
        command: &Command,
    ) -> Result<CommandResult, BridgeError> {
        let info = link.info();
        let operation = command.operation;

        if link.state() == SessionState::Terminated {
            return Err(BridgeError::transport(format!(
                "session {} is terminated",
                info.id
            )));
        }
        if command.session_id != info.id {
            return Err(BridgeError::protocol(format!(
                "command for session {} dispatched to session {}",
                command.session_id, info.id
            )));
        }

        let handler = self.table.get(info.kind, operation).ok_or_else(|| {
            BridgeError::protocol(format!(
                "{} is not supported by {} sessions",
                operation, info.kind
            ))
        })?;

        let element = self.resolve_target(link, command)?;

        if !link.transport().is_connected() {
            self.terminate_link(link, "transport disconnected");
            return Err(BridgeError::transport(format!(
                "session {} lost its backend connection",
                info.id
            )));
        }

        link.activate();
        let timeout = command.timeout.unwrap_or(self.default_timeout);
        debug!(session = %info.id, %operation, ?timeout, "Dispatching command");

        let started = Instant::now();
        let call = HandlerCall::new(command, element.as_ref());
        let invocation = AssertUnwindSafe(handler.handle(link.transport().as_ref(), call)).catch_unwind();
        let span = debug_span!("dispatch", session = %info.id, kind = %info.kind, %operation);

        let outcome = match tokio::time::timeout(timeout, invocation).instrument(span).await {
            Err(_) => {
                warn!(session = %info.id, %operation, ?timeout, "Command timed out");
                return Err(BridgeError::timeout(
                    format!("{} did not complete", operation),
                    started.elapsed(),
                ));
            }
            Ok(Err(panic)) => {
                let reason = panic_message(panic.as_ref());
                warn!(session = %info.id, %operation, %reason, "Command handler panicked");
                return Err(BridgeError::protocol(format!(
                    "{} handler panicked: {}",
                    operation, reason
                )));
            }
            Ok(Ok(outcome)) => outcome,
        };

        match outcome {
            Ok(output) => self.translate(link, command, output),
            Err(fault) => Err(self.on_fault(link, command, fault, started.elapsed())),
        }
    }

    fn resolve_target(
        &self,
        link: &SessionLink,
        command: &Command,
    ) -> Result<Option<ElementState>, BridgeError> {
        let Some(handle) = &command.element else {
            if command.operation.requires_element() {
                return Err(BridgeError::protocol(format!(
                    "{} requires a target element",
                    command.operation
                )));
            }
            return Ok(None);
        };

        if handle.session_id != link.info().id {
            return Err(BridgeError::stale_element(format!(
                "{} belongs to session {}",
                handle, handle.session_id
            )));
        }
        self.registry.resolve(handle).map(Some)
    }

    fn translate(
        &self,
        link: &SessionLink,
        command: &Command,
        output: CommandOutput,
    ) -> Result<CommandResult, BridgeError> {
        Ok(match output {
            CommandOutput::None => CommandResult::Done,
            CommandOutput::Value(value) => CommandResult::Value(value),
            CommandOutput::Text(text) => CommandResult::Text(text),
            CommandOutput::Image(bytes) => CommandResult::Image(bytes),
            CommandOutput::Elements(mut elements) => {
                match command.operation {
                    Operation::Find => elements.truncate(1),
                    Operation::FindAll => {}
                    _ => {
                        return Err(BridgeError::protocol(format!(
                            "{} handler returned elements",
                            command.operation
                        )));
                    }
                }
                let locator = command.locator().ok_or_else(|| {
                    BridgeError::protocol(format!("{} command carries no locator", command.operation))
                })?;
                let handles = self
                    .registry
                    .register_all(link.info().id, &locator, elements)?;
                CommandResult::Elements(handles)
            }
        })
    }

    fn on_fault(
        &self,
        link: &SessionLink,
        command: &Command,
        fault: BackendFault,
        elapsed: Duration,
    ) -> BridgeError {
        if fault.code.is_session_fatal() {
            self.terminate_link(link, &fault.message);
        } else if fault.code == FaultCode::StaleElement {
            if let Some(handle) = &command.element {
                self.registry.invalidate(handle);
            }
        }
        debug!(session = %link.info().id, operation = %command.operation, code = ?fault.code, "Command failed");
        classify_fault(fault, elapsed)
    }

    fn terminate_link(&self, link: &SessionLink, reason: &str) {
        if link.mark_terminated() {
            warn!(session = %link.info().id, %reason, "Session terminated by backend");
            self.registry.invalidate_all(link.info().id);
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
