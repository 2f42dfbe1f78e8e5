//! Session factory.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, info_span, Instrument};

use unibridge_protocols::backend::Backend;
use unibridge_protocols::error::{BridgeError, FaultCode};
use unibridge_protocols::types::{BackendKind, Capabilities, SessionId, SessionInfo};

use crate::dispatcher::{Dispatcher, HandlerTable, classify_fault};
use crate::registry::{BackendRegistry, ElementRegistry};
use crate::session::{Session, SessionLink};

/// Default per-command timeout.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Default interval between locator polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Opens sessions against registered backends.
pub struct Bridge {
    backends: BackendRegistry,
    dispatcher: Arc<Dispatcher>,
    poll_interval: Duration,
    connect_timeout: Duration,
}

impl Bridge {
    pub fn builder() -> BridgeBuilder {
        BridgeBuilder::new()
    }

    /// Kinds of sessions this bridge can open.
    pub fn kinds(&self) -> Vec<BackendKind> {
        self.backends.kinds()
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Open a session on the backend serving `capabilities.backend`.
    ///
    /// Fails with a transport error when the endpoint is unreachable and a
    /// protocol error when the backend rejects the capabilities.
    pub async fn create(&self, capabilities: Capabilities) -> Result<Session, BridgeError> {
        let kind = capabilities.backend;
        let backend = self.backends.get(kind).ok_or_else(|| {
            BridgeError::protocol(format!("no backend registered for {} sessions", kind))
        })?;

        let id = SessionId::new();
        let span = info_span!("session_create", session = %id, %kind, endpoint = backend.endpoint());

        async {
            let started = tokio::time::Instant::now();
            let connection =
                match tokio::time::timeout(self.connect_timeout, backend.connect(&capabilities)).await {
                    Err(_) => {
                        return Err(BridgeError::timeout(
                            format!("connecting to {}", backend.endpoint()),
                            started.elapsed(),
                        ));
                    }
                    Ok(Err(fault)) => {
                        let rejected = fault.code == FaultCode::Rejected;
                        let err = classify_fault(fault, started.elapsed());
                        return Err(if rejected {
                            BridgeError::protocol(format!("capabilities rejected: {}", err.message()))
                                .with_cause(err)
                        } else {
                            err
                        });
                    }
                    Ok(Ok(connection)) => connection,
                };

            let info = SessionInfo {
                id,
                kind,
                endpoint: backend.endpoint().to_string(),
                requested: capabilities,
                negotiated: connection.negotiated,
                created_at: Utc::now(),
            };
            self.dispatcher.registry().open(id);
            info!("Session created");

            Ok(Session::new(
                SessionLink::new(info, connection.transport),
                self.dispatcher.clone(),
                self.poll_interval,
            ))
        }
        .instrument(span)
        .await
    }
}

/// Builder for [`Bridge`].
pub struct BridgeBuilder {
    backends: Vec<Arc<dyn Backend>>,
    command_timeout: Duration,
    poll_interval: Duration,
    connect_timeout: Option<Duration>,
}

impl BridgeBuilder {
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            connect_timeout: None,
        }
    }

    pub fn backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backends.push(backend);
        self
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Bound on session creation; defaults to the command timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Register every backend and its handlers.
    pub fn build(self) -> Result<Bridge, BridgeError> {
        let registry = BackendRegistry::new();
        let mut table = HandlerTable::new();

        for backend in self.backends {
            let kind = backend.kind();
            for (operation, handler) in backend.handlers() {
                table.register(kind, operation, handler);
            }
            registry.register(backend)?;
        }

        Ok(Bridge {
            backends: registry,
            dispatcher: Arc::new(Dispatcher::new(
                table,
                Arc::new(ElementRegistry::new()),
                self.command_timeout,
            )),
            poll_interval: self.poll_interval,
            connect_timeout: self.connect_timeout.unwrap_or(self.command_timeout),
        })
    }
}

impl Default for BridgeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
