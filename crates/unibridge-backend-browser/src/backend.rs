//! Browser backend and per-session transport.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use unibridge_protocols::backend::{Backend, BackendTransport, CommandHandler, Connection};
use unibridge_protocols::command::Operation;
use unibridge_protocols::error::{BackendFault, FaultCode};
use unibridge_protocols::types::{BackendKind, Capabilities};

use crate::cdp::{discover, CdpClient, CdpError};
use crate::handlers;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Domains enabled on every new page session.
const DOMAINS: &[&str] = &["Page.enable", "DOM.enable", "Runtime.enable"];

/// Backend for Chrome/Chromium reachable over a DevTools HTTP endpoint.
pub struct BrowserBackend {
    endpoint: String,
    request_timeout: Duration,
}

impl BrowserBackend {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Upper bound for a single CDP round trip.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Probe the endpoint and return the browser's product string.
    pub async fn status(&self) -> Result<String, BackendFault> {
        discover(&self.endpoint)
            .await
            .map(|version| version.browser)
            .map_err(|e| e.into_fault("status"))
    }
}

#[async_trait]
impl Backend for BrowserBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Browser
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn connect(&self, capabilities: &Capabilities) -> Result<Connection, BackendFault> {
        let version = discover(&self.endpoint)
            .await
            .map_err(|e| e.into_fault("connect"))?;
        let client = CdpClient::connect(&version.web_socket_debugger_url, self.request_timeout)
            .await
            .map_err(|e| e.into_fault("connect"))?;

        let start_url = capabilities.get_str("startUrl").unwrap_or("about:blank");
        let target = client
            .call("Target.createTarget", Some(json!({"url": start_url})), None)
            .await
            .map_err(|e| rejected("Target.createTarget", e))?;
        let target_id = target["targetId"]
            .as_str()
            .ok_or_else(|| BackendFault::malformed("Target.createTarget", "missing targetId"))?
            .to_string();

        let attached = client
            .call(
                "Target.attachToTarget",
                Some(json!({"targetId": target_id, "flatten": true})),
                None,
            )
            .await
            .map_err(|e| rejected("Target.attachToTarget", e))?;
        let session_id = attached["sessionId"]
            .as_str()
            .ok_or_else(|| BackendFault::malformed("Target.attachToTarget", "missing sessionId"))?
            .to_string();

        for domain in DOMAINS {
            client
                .call(domain, None, Some(&session_id))
                .await
                .map_err(|e| e.into_fault(domain))?;
        }
        debug!("Enabled CDP domains for session {}", session_id);

        let mut negotiated = capabilities.entries.clone();
        negotiated.insert("browserName".to_string(), Value::String(version.browser.clone()));
        negotiated.insert(
            "protocolVersion".to_string(),
            Value::String(version.protocol_version.clone()),
        );
        negotiated.insert("targetId".to_string(), Value::String(target_id.clone()));

        info!(browser = %version.browser, target = %target_id, "Opened browser page");

        Ok(Connection {
            transport: Arc::new(BrowserTransport {
                client,
                target_id,
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

/// Capability problems surface as protocol errors on create, while a lost
/// connection keeps its own fault code.
fn rejected(method: &str, error: CdpError) -> BackendFault {
    match error {
        CdpError::Protocol { .. } => BackendFault::new(FaultCode::Rejected, method, error.to_string()),
        other => other.into_fault(method),
    }
}

/// One page target attached in flat mode.
pub struct BrowserTransport {
    client: CdpClient,
    target_id: String,
    session_id: String,
    open: AtomicBool,
}

impl BrowserTransport {
    pub fn target_id(&self) -> &str {
        &self.target_id
    }
}

#[async_trait]
impl BackendTransport for BrowserTransport {
    async fn call(&self, method: &str, params: Value) -> Result<Value, BackendFault> {
        if !self.open.load(Ordering::Acquire) {
            return Err(BackendFault::new(
                FaultCode::Disconnected,
                method,
                "page session was closed",
            ));
        }
        let params = (!params.is_null()).then_some(params);
        self.client
            .call(method, params, Some(&self.session_id))
            .await
            .map_err(|e| e.into_fault(method))
    }

    async fn close(&self) -> Result<(), BackendFault> {
        if !self.open.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        let result = if self.client.is_connected() {
            self.client
                .call("Target.closeTarget", Some(json!({"targetId": self.target_id})), None)
                .await
                .map(|_| ())
                .map_err(|e| e.into_fault("Target.closeTarget"))
        } else {
            Ok(())
        };
        self.client.close().await;
        result
    }

    fn is_connected(&self) -> bool {
        self.open.load(Ordering::Acquire) && self.client.is_connected()
    }
}
