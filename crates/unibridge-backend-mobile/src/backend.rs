//! Mobile backend and per-session transport.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};

use unibridge_protocols::backend::{Backend, BackendTransport, CommandHandler, Connection};
use unibridge_protocols::command::Operation;
use unibridge_protocols::error::{BackendFault, FaultCode};
use unibridge_protocols::types::{BackendKind, Capabilities};

use crate::client::WebDriverClient;
use crate::handlers;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Backend for an Appium server.
pub struct MobileBackend {
    client: Arc<WebDriverClient>,
}

impl MobileBackend {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Arc::new(WebDriverClient::new(&endpoint.into(), DEFAULT_REQUEST_TIMEOUT)),
        }
    }

    /// Upper bound for a single HTTP round trip.
    pub fn with_request_timeout(self, timeout: Duration) -> Self {
        Self {
            client: Arc::new(WebDriverClient::new(self.client.endpoint(), timeout)),
        }
    }

    /// Server status as reported by `GET /status`.
    pub async fn status(&self) -> Result<Value, BackendFault> {
        self.client.execute("status", None, Value::Null).await
    }
}

#[async_trait]
impl Backend for MobileBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Mobile
    }

    fn endpoint(&self) -> &str {
        self.client.endpoint()
    }

    async fn connect(&self, capabilities: &Capabilities) -> Result<Connection, BackendFault> {
        let body = json!({
            "capabilities": {
                "alwaysMatch": capabilities.entries,
                "firstMatch": [{}],
            }
        });
        let created = self.client.execute("newSession", None, body).await?;

        let session_id = created
            .get("sessionId")
            .and_then(|id| id.as_str())
            .ok_or_else(|| BackendFault::malformed("newSession", "missing sessionId"))?
            .to_string();
        let mut negotiated = created
            .get("capabilities")
            .and_then(|c| c.as_object())
            .cloned()
            .unwrap_or_else(|| capabilities.entries.clone());
        negotiated.insert("sessionId".to_string(), Value::String(session_id.clone()));

        info!(
            session = %session_id,
            platform = negotiated.get("platformName").and_then(|p| p.as_str()).unwrap_or("unknown"),
            "Created Appium session"
        );

        Ok(Connection {
            transport: Arc::new(MobileTransport {
                client: self.client.clone(),
                session_id,
                open: AtomicBool::new(true),
            }),
            negotiated,
        })
    }

    fn handlers(&self) -> Vec<(Operation, Arc<dyn CommandHandler>)> {
        handlers::all()
    }
}

/// One WebDriver session on the shared HTTP client.
pub struct MobileTransport {
    client: Arc<WebDriverClient>,
    session_id: String,
    open: AtomicBool,
}

impl MobileTransport {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

#[async_trait]
impl BackendTransport for MobileTransport {
    async fn call(&self, method: &str, params: Value) -> Result<Value, BackendFault> {
        if !self.open.load(Ordering::Acquire) {
            return Err(BackendFault::new(
                FaultCode::Disconnected,
                method,
                "Appium session was closed",
            ));
        }
        let result = self.client.execute(method, Some(&self.session_id), params).await;
        if let Err(fault) = &result {
            if fault.code.is_session_fatal() {
                warn!(session = %self.session_id, "Appium session lost: {}", fault.message);
                self.open.store(false, Ordering::Release);
            }
        }
        result
    }

    async fn close(&self) -> Result<(), BackendFault> {
        if !self.open.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        match self.client.execute("deleteSession", Some(&self.session_id), Value::Null).await {
            Ok(_) => Ok(()),
            // Already gone on the server side.
            Err(fault) if fault.code == FaultCode::InvalidSession => Ok(()),
            Err(fault) => Err(fault),
        }
    }

    fn is_connected(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}
