//! WebDriver command table.

use reqwest::Method;
use serde_json::{Map, Value};

/// HTTP verb and path template of one WebDriver command.
///
/// Templates use `:session_id`, `:element_id` and `:name` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub method: Method,
    pub path: &'static str,
}

pub const COMMANDS: &[(&str, &str, &str)] = &[
    ("status", "GET", "/status"),
    ("newSession", "POST", "/session"),
    ("deleteSession", "DELETE", "/session/:session_id"),
    ("findElement", "POST", "/session/:session_id/element"),
    ("findElements", "POST", "/session/:session_id/elements"),
    ("click", "POST", "/session/:session_id/element/:element_id/click"),
    ("sendKeys", "POST", "/session/:session_id/element/:element_id/value"),
    ("clear", "POST", "/session/:session_id/element/:element_id/clear"),
    ("getText", "GET", "/session/:session_id/element/:element_id/text"),
    ("getAttribute", "GET", "/session/:session_id/element/:element_id/attribute/:name"),
    ("getElementRect", "GET", "/session/:session_id/element/:element_id/rect"),
    ("screenshot", "GET", "/session/:session_id/screenshot"),
    ("elementScreenshot", "GET", "/session/:session_id/element/:element_id/screenshot"),
    ("getPageSource", "GET", "/session/:session_id/source"),
    ("back", "POST", "/session/:session_id/back"),
    ("navigateTo", "POST", "/session/:session_id/url"),
    ("getContexts", "GET", "/session/:session_id/contexts"),
    ("getCurrentContext", "GET", "/session/:session_id/context"),
    ("switchContext", "POST", "/session/:session_id/context"),
    ("launchApp", "POST", "/session/:session_id/appium/app/launch"),
    ("activateApp", "POST", "/session/:session_id/appium/device/activate_app"),
    ("terminateApp", "POST", "/session/:session_id/appium/device/terminate_app"),
];

/// Find the route of a command by name.
pub fn lookup(command: &str) -> Option<Route> {
    COMMANDS
        .iter()
        .find(|(name, _, _)| *name == command)
        .and_then(|(_, verb, path)| {
            Some(Route {
                method: verb.parse().ok()?,
                path,
            })
        })
}

impl Route {
    /// Fill the path template and return the leftover parameters as the body.
    ///
    /// Parameters consumed by placeholders are removed from the body. A
    /// placeholder with no matching parameter is an error naming it.
    pub fn render(
        &self,
        session_id: Option<&str>,
        mut params: Map<String, Value>,
    ) -> Result<(String, Map<String, Value>), String> {
        let mut path = String::with_capacity(self.path.len() + 48);
        for segment in self.path.split('/').skip(1) {
            path.push('/');
            match segment.strip_prefix(':') {
                Some("session_id") => {
                    path.push_str(session_id.ok_or("command needs a session")?);
                }
                Some(placeholder) => {
                    let value = params
                        .remove(placeholder)
                        .ok_or_else(|| format!("missing path parameter '{}'", placeholder))?;
                    match value {
                        Value::String(s) => path.push_str(&encode_segment(&s)),
                        other => path.push_str(&other.to_string()),
                    }
                }
                None => path.push_str(segment),
            }
        }
        Ok((path, params))
    }
}

fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        if byte.is_ascii_alphanumeric() || b"-._~".contains(&byte) {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}
