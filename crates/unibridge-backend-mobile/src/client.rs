//! HTTP client for a WebDriver endpoint.

use std::time::Duration;

use reqwest::{Client, Method};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use unibridge_protocols::error::{BackendFault, FaultCode};

use crate::commands::lookup;
use crate::error::{fault_code, legacy_error};

/// Sends named WebDriver commands and unwraps the `{"value": ...}` envelope.
pub struct WebDriverClient {
    http: Client,
    endpoint: String,
    request_timeout: Duration,
}

impl WebDriverClient {
    pub fn new(endpoint: &str, request_timeout: Duration) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            request_timeout,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Execute a command from the command table.
    ///
    /// `params` must be a JSON object or null. Keys named by path placeholders
    /// are moved into the URL; the rest become the request body.
    pub async fn execute(
        &self,
        command: &str,
        session_id: Option<&str>,
        params: Value,
    ) -> Result<Value, BackendFault> {
        let route = lookup(command).ok_or_else(|| BackendFault::unsupported(command))?;
        let params = match params {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(BackendFault::new(
                    FaultCode::Rejected,
                    command,
                    format!("parameters must be an object, got {}", other),
                ));
            }
        };
        let (path, body) = route
            .render(session_id, params)
            .map_err(|e| BackendFault::new(FaultCode::Rejected, command, e))?;

        let url = format!("{}{}", self.endpoint, path);
        trace!("{} {} {}", route.method, url, command);

        let mut request = self
            .http
            .request(route.method.clone(), &url)
            .timeout(self.request_timeout);
        // WebDriver servers expect a JSON object on every POST, even an empty one.
        if route.method == Method::POST {
            request = request.json(&Value::Object(body));
        }

        let response = request.send().await.map_err(|e| network_fault(command, e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| network_fault(command, e))?;
        debug!("{} -> HTTP {}", command, status.as_u16());

        let payload: Value = match serde_json::from_str(&text) {
            Ok(payload) => payload,
            Err(e) if status.is_success() => {
                return Err(BackendFault::malformed(command, format!("invalid JSON response: {}", e)));
            }
            Err(_) => {
                let code = if status.as_u16() == 404 || status.as_u16() == 405 {
                    FaultCode::Unsupported
                } else {
                    FaultCode::Rejected
                };
                return Err(BackendFault::new(code, command, format!("HTTP {}: {}", status.as_u16(), text.trim())));
            }
        };

        unwrap_value(command, status.is_success(), payload)
    }
}

/// Split a WebDriver payload into its value or the error it carries.
fn unwrap_value(command: &str, success: bool, mut payload: Value) -> Result<Value, BackendFault> {
    let value = payload.get_mut("value").map(Value::take).unwrap_or(Value::Null);

    let error = match value.get("error").and_then(|e| e.as_str()) {
        Some(error) if !success || value.get("message").is_some() => Some(error.to_string()),
        _ => match payload.get("status").and_then(|s| s.as_i64()) {
            Some(status) if status != 0 => Some(legacy_error(status).to_string()),
            _ if !success => Some("unknown error".to_string()),
            _ => None,
        },
    };

    match error {
        Some(error) => {
            let message = value
                .get("message")
                .and_then(|m| m.as_str())
                .filter(|m| !m.is_empty())
                .unwrap_or(&error);
            Err(BackendFault::new(fault_code(&error), command, message))
        }
        // Legacy servers put the session id at the top level.
        None if value.is_null() && payload.get("sessionId").is_some() => Ok(payload),
        None => Ok(value),
    }
}

fn network_fault(command: &str, error: reqwest::Error) -> BackendFault {
    let code = if error.is_timeout() {
        FaultCode::Timeout
    } else if error.is_connect() {
        FaultCode::Unreachable
    } else {
        FaultCode::Disconnected
    };
    BackendFault::new(code, command, error.to_string()).with_cause(error)
}
