//! Sessions: one live connection to a mobile device or a browser.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use tracing::{info, info_span, warn, Instrument};

use unibridge_protocols::backend::BackendTransport;
use unibridge_protocols::command::{Command, CommandResult, Operation, PlannedStep};
use unibridge_protocols::error::{BridgeError, ErrorKind};
use unibridge_protocols::types::{ElementHandle, Locator, SessionId, SessionInfo, SessionState};

use crate::dispatcher::Dispatcher;

const CREATED: u8 = 0;
const ACTIVE: u8 = 1;
const TERMINATED: u8 = 2;

/// Floor for a single `find` probe so a zero-length wait still reaches the backend.
const MIN_PROBE_TIMEOUT: Duration = Duration::from_millis(10);

/// Live state shared between a [`Session`] and the dispatcher.
pub struct SessionLink {
    info: SessionInfo,
    state: AtomicU8,
    transport: Arc<dyn BackendTransport>,
}

impl SessionLink {
    pub fn new(info: SessionInfo, transport: Arc<dyn BackendTransport>) -> Self {
        Self {
            info,
            state: AtomicU8::new(CREATED),
            transport,
        }
    }

    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    pub fn transport(&self) -> &Arc<dyn BackendTransport> {
        &self.transport
    }

    pub fn state(&self) -> SessionState {
        match self.state.load(Ordering::Acquire) {
            CREATED => SessionState::Created,
            ACTIVE => SessionState::Active,
            _ => SessionState::Terminated,
        }
    }

    /// `Created -> Active`; no-op in any other state.
    pub(crate) fn activate(&self) {
        let _ = self
            .state
            .compare_exchange(CREATED, ACTIVE, Ordering::AcqRel, Ordering::Acquire);
    }

    /// Move to `Terminated`. Returns `false` if the session already was.
    pub(crate) fn mark_terminated(&self) -> bool {
        self.state.swap(TERMINATED, Ordering::AcqRel) != TERMINATED
    }
}

/// Element actions accepted by [`Session::act`].
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Click,
    Type(String),
    Clear,
}

/// A caller-owned automation session.
///
/// All operations go through the command dispatcher; a terminated session
/// rejects every further command with a transport error.
pub struct Session {
    link: Arc<SessionLink>,
    dispatcher: Arc<Dispatcher>,
    poll_interval: Duration,
}

impl Session {
    pub(crate) fn new(link: SessionLink, dispatcher: Arc<Dispatcher>, poll_interval: Duration) -> Self {
        Self {
            link: Arc::new(link),
            dispatcher,
            poll_interval,
        }
    }

    pub fn id(&self) -> SessionId {
        self.link.info().id
    }

    pub fn info(&self) -> &SessionInfo {
        self.link.info()
    }

    pub fn state(&self) -> SessionState {
        self.link.state()
    }

    pub fn is_terminated(&self) -> bool {
        self.state() == SessionState::Terminated
    }

    /// Dispatch an arbitrary command built for this session.
    pub async fn execute(&self, command: &Command) -> Result<CommandResult, BridgeError> {
        self.dispatcher.dispatch(&self.link, command).await
    }

    fn command(&self, operation: Operation) -> Command {
        Command::new(self.id(), operation)
    }

    /// Open a URL (browser) or launch/activate an app (mobile).
    pub async fn navigate(&self, target: &str) -> Result<(), BridgeError> {
        let command = self.command(Operation::Navigate).with_param("target", target);
        self.execute(&command).await.map(|_| ())
    }

    /// Poll until `locator` matches or `timeout` elapses.
    pub async fn find(&self, locator: &Locator, timeout: Duration) -> Result<ElementHandle, BridgeError> {
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let probe = self
                .command(Operation::Find)
                .with_locator(locator)
                .with_timeout(remaining.max(MIN_PROBE_TIMEOUT));

            match self.execute(&probe).await {
                Ok(result) => {
                    if let Some(handle) = result.into_elements()?.into_iter().next() {
                        return Ok(handle);
                    }
                }
                Err(e) if e.kind() == ErrorKind::ElementNotFound => {}
                Err(e) if e.kind() == ErrorKind::Timeout && Instant::now() >= deadline => {}
                Err(e) => return Err(e),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(BridgeError::element_not_found(format!(
                    "{} not found within {:?}",
                    locator, timeout
                )));
            }
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    /// Locate every current match with a single query.
    pub async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementHandle>, BridgeError> {
        let command = self.command(Operation::FindAll).with_locator(locator);
        self.execute(&command).await?.into_elements()
    }

    /// Perform a click/type/clear on a located element.
    pub async fn act(&self, element: &ElementHandle, action: Action) -> Result<(), BridgeError> {
        let command = match action {
            Action::Click => self.command(Operation::Click),
            Action::Type(text) => self.command(Operation::Type).with_param("text", text),
            Action::Clear => self.command(Operation::Clear),
        };
        self.execute(&command.with_element(element.clone()))
            .await
            .map(|_| ())
    }

    pub async fn click(&self, element: &ElementHandle) -> Result<(), BridgeError> {
        self.act(element, Action::Click).await
    }

    pub async fn type_text(&self, element: &ElementHandle, text: &str) -> Result<(), BridgeError> {
        self.act(element, Action::Type(text.to_string())).await
    }

    pub async fn clear(&self, element: &ElementHandle) -> Result<(), BridgeError> {
        self.act(element, Action::Clear).await
    }

    pub async fn get_text(&self, element: &ElementHandle) -> Result<String, BridgeError> {
        let command = self.command(Operation::GetText).with_element(element.clone());
        self.execute(&command).await?.into_text()
    }

    pub async fn get_attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, BridgeError> {
        let command = self
            .command(Operation::GetAttribute)
            .with_element(element.clone())
            .with_param("name", name);
        match self.execute(&command).await?.into_value()? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            other => Ok(Some(other.to_string())),
        }
    }

    /// Capture the whole session, or only `element` when given.
    pub async fn screenshot(&self, element: Option<&ElementHandle>) -> Result<Vec<u8>, BridgeError> {
        let mut command = self.command(Operation::Screenshot);
        if let Some(element) = element {
            command = command.with_element(element.clone());
        }
        self.execute(&command).await?.into_image()
    }

    /// Run a script in the page. Browser sessions only.
    pub async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value, BridgeError> {
        let command = self
            .command(Operation::ExecuteScript)
            .with_param("script", script)
            .with_param("args", Value::Array(args));
        self.execute(&command).await?.into_value()
    }

    /// Switch between `NATIVE_APP` and `WEBVIEW_*` contexts.
    pub async fn switch_context(&self, name: &str) -> Result<(), BridgeError> {
        let command = self.command(Operation::SwitchContext).with_param("name", name);
        self.execute(&command).await.map(|_| ())
    }

    /// Context names available to a mobile session.
    pub async fn get_contexts(&self) -> Result<Vec<String>, BridgeError> {
        let value = self.execute(&self.command(Operation::GetContexts)).await?.into_value()?;
        serde_json::from_value(value)
            .map_err(|e| BridgeError::protocol(format!("invalid context list: {}", e)).with_cause(e))
    }

    pub async fn page_source(&self) -> Result<String, BridgeError> {
        self.execute(&self.command(Operation::PageSource)).await?.into_text()
    }

    pub async fn back(&self) -> Result<(), BridgeError> {
        self.execute(&self.command(Operation::Back)).await.map(|_| ())
    }

    /// Execute one interpreted step, locating its target first when needed.
    pub async fn run_step(
        &self,
        step: &PlannedStep,
        find_timeout: Duration,
    ) -> Result<CommandResult, BridgeError> {
        let mut command = self.command(step.operation);
        command.params = step.params.clone();

        match (&step.locator, step.operation) {
            (Some(locator), Operation::Find | Operation::FindAll) => {
                command = command.with_locator(locator);
            }
            (Some(locator), op) if op.requires_element() || op == Operation::Screenshot => {
                let element = self.find(locator, find_timeout).await?;
                command = command.with_element(element);
            }
            _ => {}
        }

        self.execute(&command).await
    }

    /// Release backend resources. Terminating twice is a no-op.
    pub async fn terminate(&self) -> Result<(), BridgeError> {
        if !self.link.mark_terminated() {
            return Ok(());
        }

        let id = self.id();
        let span = info_span!("session_terminate", session = %id, kind = %self.info().kind);
        async {
            self.dispatcher.registry().invalidate_all(id);
            if let Err(fault) = self.link.transport().close().await {
                warn!(error = %fault, "Backend close failed; session is terminated anyway");
            }
            info!("Session terminated");
        }
        .instrument(span)
        .await;
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id())
            .field("kind", &self.info().kind)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
