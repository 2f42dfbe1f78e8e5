//! Browser command handlers.
//!
//! Element references are DOM `backendNodeId`s rendered as strings.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde_json::{json, Value};
use tracing::debug;

use unibridge_protocols::backend::{BackendTransport, CommandHandler, HandlerCall};
use unibridge_protocols::command::{CommandOutput, ElementRef, Operation};
use unibridge_protocols::error::{BackendFault, FaultCode};
use unibridge_protocols::types::{ElementSnapshot, Rect};

use crate::cdp::BoxModel;
use crate::selector::{query_for, DomQuery};

const LOAD_POLL: Duration = Duration::from_millis(100);

/// Handlers for every operation a browser supports. Contexts are
/// mobile-only and have none.
pub(crate) fn all() -> Vec<(Operation, Arc<dyn CommandHandler>)> {
    Operation::ALL
        .into_iter()
        .filter(|op| !matches!(op, Operation::SwitchContext | Operation::GetContexts))
        .map(|operation| (operation, Arc::new(BrowserHandler { operation }) as Arc<dyn CommandHandler>))
        .collect()
}

struct BrowserHandler {
    operation: Operation,
}

#[async_trait]
impl CommandHandler for BrowserHandler {
    async fn handle(
        &self,
        transport: &dyn BackendTransport,
        call: HandlerCall<'_>,
    ) -> Result<CommandOutput, BackendFault> {
        match self.operation {
            Operation::Navigate => navigate(transport, call.require_str("target")?).await,
            Operation::Find | Operation::FindAll => find(transport, &call).await.map(CommandOutput::Elements),
            Operation::Click => click(transport, node_id(&call)?).await,
            Operation::Type => {
                let node = node_id(&call)?;
                let text = call.require_str("text")?;
                transport.call("DOM.focus", json!({"backendNodeId": node})).await?;
                transport.call("Input.insertText", json!({"text": text})).await?;
                Ok(CommandOutput::None)
            }
            Operation::Clear => {
                call_on_node(
                    transport,
                    node_id(&call)?,
                    "function() { this.value = ''; this.dispatchEvent(new Event('input', { bubbles: true })); }",
                    vec![],
                )
                .await?;
                Ok(CommandOutput::None)
            }
            Operation::GetText => {
                let value = call_on_node(
                    transport,
                    node_id(&call)?,
                    "function() { return this.innerText ?? this.textContent ?? ''; }",
                    vec![],
                )
                .await?;
                text_payload("Runtime.callFunctionOn", value)
            }
            Operation::GetAttribute => {
                let name = call.require_str("name")?;
                let value = call_on_node(
                    transport,
                    node_id(&call)?,
                    "function(name) { return this.getAttribute(name); }",
                    vec![Value::String(name.to_string())],
                )
                .await?;
                Ok(CommandOutput::Value(value))
            }
            Operation::ExecuteScript => {
                let script = call.require_str("script")?;
                let args = call.command.param("args").cloned().unwrap_or(Value::Array(vec![]));
                let expression = format!("(function() {{ {} }}).apply(null, {})", script, args);
                evaluate(transport, &expression).await.map(CommandOutput::Value)
            }
            Operation::Screenshot => {
                let node = call.element.map(|_| node_id(&call)).transpose()?;
                screenshot(transport, node).await.map(CommandOutput::Image)
            }
            Operation::PageSource => {
                let html = evaluate(transport, "document.documentElement.outerHTML").await?;
                text_payload("Runtime.evaluate", html)
            }
            Operation::Back => go_back(transport).await,
            Operation::SwitchContext | Operation::GetContexts => {
                Err(BackendFault::unsupported(self.operation.as_str()))
            }
        }
    }
}

fn node_id(call: &HandlerCall<'_>) -> Result<i64, BackendFault> {
    let backend_ref = call.element_ref()?;
    backend_ref.parse().map_err(|_| {
        BackendFault::malformed(
            call.command.operation.as_str(),
            format!("'{}' is not a DOM node reference", backend_ref),
        )
    })
}

async fn navigate(transport: &dyn BackendTransport, url: &str) -> Result<CommandOutput, BackendFault> {
    if url.is_empty() {
        return Err(BackendFault::new(FaultCode::Rejected, "Page.navigate", "navigation needs a URL"));
    }
    let result = transport.call("Page.navigate", json!({"url": url})).await?;
    if let Some(error) = result.get("errorText").and_then(|v| v.as_str()) {
        return Err(BackendFault::new(FaultCode::Rejected, "Page.navigate", error));
    }

    // Bounded by the command timeout around the handler.
    loop {
        let state = evaluate(transport, "document.readyState").await?;
        if matches!(state.as_str(), Some("complete" | "interactive")) {
            break;
        }
        tokio::time::sleep(LOAD_POLL).await;
    }
    debug!("Navigated to {}", url);
    Ok(CommandOutput::None)
}

async fn find(transport: &dyn BackendTransport, call: &HandlerCall<'_>) -> Result<Vec<ElementRef>, BackendFault> {
    let method = call.command.operation.as_str();
    let locator = call
        .command
        .locator()
        .ok_or_else(|| BackendFault::new(FaultCode::Rejected, method, "missing locator"))?;
    let query = query_for(&locator).map_err(|e| BackendFault::new(FaultCode::Rejected, method, e))?;

    let document = transport.call("DOM.getDocument", json!({"depth": 0})).await?;
    let root = document["root"]["nodeId"]
        .as_i64()
        .ok_or_else(|| BackendFault::malformed("DOM.getDocument", "missing root nodeId"))?;

    let mut node_ids = match query {
        DomQuery::Css(selector) => {
            let result = transport
                .call("DOM.querySelectorAll", json!({"nodeId": root, "selector": selector}))
                .await?;
            ids("DOM.querySelectorAll", &result)?
        }
        DomQuery::XPath(expression) => xpath_search(transport, &expression).await?,
    };
    if call.command.operation == Operation::Find {
        node_ids.truncate(1);
    }

    let mut elements = Vec::with_capacity(node_ids.len());
    for node in node_ids {
        let described = transport.call("DOM.describeNode", json!({"nodeId": node})).await?;
        let backend_id = described["node"]["backendNodeId"]
            .as_i64()
            .ok_or_else(|| BackendFault::malformed("DOM.describeNode", "missing backendNodeId"))?;
        let rect = box_model(transport, backend_id).await.ok().map(|model| {
            let (x, y, width, height) = model.bounds();
            Rect { x, y, width, height }
        });
        elements.push(ElementRef::new(backend_id.to_string()).with_snapshot(ElementSnapshot { text: None, rect }));
    }
    Ok(elements)
}

async fn xpath_search(transport: &dyn BackendTransport, expression: &str) -> Result<Vec<i64>, BackendFault> {
    let search = transport
        .call("DOM.performSearch", json!({"query": expression}))
        .await?;
    let search_id = search["searchId"]
        .as_str()
        .ok_or_else(|| BackendFault::malformed("DOM.performSearch", "missing searchId"))?
        .to_string();
    let count = search["resultCount"]
        .as_u64()
        .ok_or_else(|| BackendFault::malformed("DOM.performSearch", "missing resultCount"))?;

    let found = if count == 0 {
        Ok(Vec::new())
    } else {
        transport
            .call(
                "DOM.getSearchResults",
                json!({"searchId": search_id, "fromIndex": 0, "toIndex": count}),
            )
            .await
            .and_then(|result| ids("DOM.getSearchResults", &result))
    };
    transport
        .call("DOM.discardSearchResults", json!({"searchId": search_id}))
        .await?;
    found
}

/// Node ids of a query result; `0` marks a node outside the document.
fn ids(method: &str, result: &Value) -> Result<Vec<i64>, BackendFault> {
    let items = result["nodeIds"]
        .as_array()
        .ok_or_else(|| BackendFault::malformed(method, "missing nodeIds"))?;
    items
        .iter()
        .map(|v| {
            v.as_i64()
                .ok_or_else(|| BackendFault::malformed(method, format!("not a node id: {}", v)))
        })
        .filter(|id| !matches!(id, Ok(0)))
        .collect()
}

fn text_payload(method: &str, value: Value) -> Result<CommandOutput, BackendFault> {
    match value {
        Value::String(text) => Ok(CommandOutput::Text(text)),
        other => Err(BackendFault::malformed(method, format!("expected a string, got {}", other))),
    }
}

async fn box_model(transport: &dyn BackendTransport, node: i64) -> Result<BoxModel, BackendFault> {
    let result = transport.call("DOM.getBoxModel", json!({"backendNodeId": node})).await?;
    serde_json::from_value(result["model"].clone())
        .map_err(|e| BackendFault::malformed("DOM.getBoxModel", e.to_string()))
}

async fn click(transport: &dyn BackendTransport, node: i64) -> Result<CommandOutput, BackendFault> {
    transport
        .call("DOM.scrollIntoViewIfNeeded", json!({"backendNodeId": node}))
        .await?;
    let (x, y) = box_model(transport, node).await?.center();

    for event in ["mousePressed", "mouseReleased"] {
        transport
            .call(
                "Input.dispatchMouseEvent",
                json!({"type": event, "x": x, "y": y, "button": "left", "clickCount": 1}),
            )
            .await?;
    }
    debug!("Clicked node {} at ({}, {})", node, x, y);
    Ok(CommandOutput::None)
}

async fn call_on_node(
    transport: &dyn BackendTransport,
    node: i64,
    function: &str,
    args: Vec<Value>,
) -> Result<Value, BackendFault> {
    let resolved = transport.call("DOM.resolveNode", json!({"backendNodeId": node})).await?;
    let object_id = resolved["object"]["objectId"]
        .as_str()
        .ok_or_else(|| BackendFault::malformed("DOM.resolveNode", "missing objectId"))?;

    let arguments: Vec<Value> = args.into_iter().map(|v| json!({"value": v})).collect();
    let result = transport
        .call(
            "Runtime.callFunctionOn",
            json!({
                "objectId": object_id,
                "functionDeclaration": function,
                "arguments": arguments,
                "returnByValue": true,
                "awaitPromise": true,
            }),
        )
        .await?;
    script_value("Runtime.callFunctionOn", result)
}

async fn evaluate(transport: &dyn BackendTransport, expression: &str) -> Result<Value, BackendFault> {
    let result = transport
        .call(
            "Runtime.evaluate",
            json!({"expression": expression, "returnByValue": true, "awaitPromise": true}),
        )
        .await?;
    script_value("Runtime.evaluate", result)
}

fn script_value(method: &str, result: Value) -> Result<Value, BackendFault> {
    if let Some(exception) = result.get("exceptionDetails") {
        let text = exception["exception"]["description"]
            .as_str()
            .or_else(|| exception["text"].as_str())
            .unwrap_or("Unknown error");
        return Err(BackendFault::new(FaultCode::Rejected, method, format!("script error: {}", text)));
    }
    let remote = result
        .get("result")
        .ok_or_else(|| BackendFault::malformed(method, "missing result object"))?;
    // `undefined` comes back without a value.
    Ok(remote.get("value").cloned().unwrap_or(Value::Null))
}

async fn screenshot(transport: &dyn BackendTransport, node: Option<i64>) -> Result<Vec<u8>, BackendFault> {
    let mut params = json!({"format": "png"});
    if let Some(node) = node {
        let (x, y, width, height) = box_model(transport, node).await?.bounds();
        params["clip"] = json!({"x": x, "y": y, "width": width, "height": height, "scale": 1});
        params["captureBeyondViewport"] = json!(true);
    }

    let result = transport.call("Page.captureScreenshot", params).await?;
    let data = result["data"]
        .as_str()
        .ok_or_else(|| BackendFault::malformed("Page.captureScreenshot", "missing screenshot data"))?;
    base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| BackendFault::malformed("Page.captureScreenshot", e.to_string()))
}

async fn go_back(transport: &dyn BackendTransport) -> Result<CommandOutput, BackendFault> {
    let history = transport.call("Page.getNavigationHistory", Value::Null).await?;
    let current = history["currentIndex"]
        .as_u64()
        .ok_or_else(|| BackendFault::malformed("Page.getNavigationHistory", "missing currentIndex"))?
        as usize;
    if current == 0 {
        return Ok(CommandOutput::None);
    }
    let entry_id = history["entries"][current - 1]["id"]
        .as_i64()
        .ok_or_else(|| BackendFault::malformed("Page.getNavigationHistory", "missing history entry"))?;
    transport
        .call("Page.navigateToHistoryEntry", json!({"entryId": entry_id}))
        .await?;
    Ok(CommandOutput::None)
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
