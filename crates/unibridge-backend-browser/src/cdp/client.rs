//! CDP WebSocket client.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

use super::error::CdpError;
use super::protocol::{BrowserVersion, CdpRequest, CdpResponse};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;
type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value, CdpError>>>>>;

/// Fetch `/json/version` from a DevTools HTTP endpoint.
pub async fn discover(endpoint: &str) -> Result<BrowserVersion, CdpError> {
    let version_url = format!("{}/json/version", endpoint.trim_end_matches('/'));
    debug!("Fetching browser version from {}", version_url);

    reqwest::get(&version_url)
        .await
        .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?
        .error_for_status()
        .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?
        .json()
        .await
        .map_err(|e| CdpError::InvalidResponse(format!("/json/version: {}", e)))
}

/// One DevTools WebSocket connection.
///
/// Page sessions are multiplexed over it in flat mode by passing their
/// `sessionId` to [`CdpClient::call`].
pub struct CdpClient {
    ws_tx: tokio::sync::Mutex<WsSink>,
    request_id: AtomicU64,
    pending: Pending,
    alive: Arc<AtomicBool>,
    timeout: Duration,
    recv_task: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to a browser WebSocket URL (`webSocketDebuggerUrl`).
    pub async fn connect(ws_url: &str, timeout: Duration) -> Result<Self, CdpError> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(ws_url)
            .await
            .map_err(|e| CdpError::ConnectionFailed(format!("WebSocket {}: {}", ws_url, e)))?;

        let (ws_sink, ws_source) = ws_stream.split();
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let alive = Arc::new(AtomicBool::new(true));

        let recv_task = {
            let pending = pending.clone();
            let alive = alive.clone();
            tokio::spawn(async move {
                Self::receive_loop(ws_source, pending.clone()).await;
                alive.store(false, Ordering::Release);
                // Wake everyone still waiting; their sender drops with the map entry.
                pending.lock().clear();
            })
        };

        debug!("CDP client connected to {}", ws_url);

        Ok(Self {
            ws_tx: tokio::sync::Mutex::new(ws_sink),
            request_id: AtomicU64::new(1),
            pending,
            alive,
            timeout,
            recv_task,
        })
    }

    async fn receive_loop(mut ws_source: WsSource, pending: Pending) {
        while let Some(msg) = ws_source.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    trace!("CDP recv: {}", text);
                    let resp = match serde_json::from_str::<CdpResponse>(&text) {
                        Ok(resp) => resp,
                        Err(e) => {
                            warn!("Failed to parse CDP message: {}", e);
                            continue;
                        }
                    };
                    let Some(id) = resp.id else {
                        // Event; nothing subscribes to them.
                        continue;
                    };
                    if let Some(tx) = pending.lock().remove(&id) {
                        let result = match resp.error {
                            Some(error) => Err(CdpError::Protocol {
                                code: error.code,
                                message: error.message,
                            }),
                            None => Ok(resp.result.unwrap_or(Value::Null)),
                        };
                        let _ = tx.send(result);
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("WebSocket closed");
                    break;
                }
                Err(e) => {
                    warn!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    }

    /// Send a CDP command and wait for its response.
    pub async fn call(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        if !self.is_connected() {
            return Err(CdpError::SessionClosed);
        }

        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id: session_id.map(str::to_string),
        };

        let json = serde_json::to_string(&request)?;
        trace!("CDP send: {}", json);

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        {
            let mut ws = self.ws_tx.lock().await;
            if let Err(e) = ws.send(Message::Text(json.into())).await {
                self.pending.lock().remove(&id);
                return Err(e.into());
            }
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(CdpError::Timeout(format!("Request {} timed out", method)))
            }
        }
    }

    /// Whether the receive loop is still running.
    pub fn is_connected(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Send a close frame; the receive loop ends when the browser answers.
    pub async fn close(&self) {
        let mut ws = self.ws_tx.lock().await;
        if let Err(e) = ws.close().await {
            debug!("Closing CDP WebSocket failed: {}", e);
        }
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self.recv_task.abort();
    }
}
