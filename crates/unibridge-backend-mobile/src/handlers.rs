//! Mobile command handlers.
//!
//! Element references are WebDriver element ids.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use serde_json::{json, Value};

use unibridge_protocols::backend::{BackendTransport, CommandHandler, HandlerCall};
use unibridge_protocols::command::{CommandOutput, ElementRef, Operation};
use unibridge_protocols::error::{BackendFault, FaultCode};

/// W3C element identifier key; older Appium drivers use `ELEMENT`.
pub(crate) const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Handlers for every operation Appium supports. Script execution is
/// browser-only.
pub(crate) fn all() -> Vec<(Operation, Arc<dyn CommandHandler>)> {
    Operation::ALL
        .into_iter()
        .filter(|op| *op != Operation::ExecuteScript)
        .map(|operation| (operation, Arc::new(MobileHandler { operation }) as Arc<dyn CommandHandler>))
        .collect()
}

struct MobileHandler {
    operation: Operation,
}

#[async_trait]
impl CommandHandler for MobileHandler {
    async fn handle(
        &self,
        transport: &dyn BackendTransport,
        call: HandlerCall<'_>,
    ) -> Result<CommandOutput, BackendFault> {
        match self.operation {
            Operation::Navigate => navigate(transport, call.require_str("target")?).await,
            Operation::Find | Operation::FindAll => {
                let method = call.command.operation.as_str();
                let locator = call
                    .command
                    .locator()
                    .ok_or_else(|| BackendFault::new(FaultCode::Rejected, method, "missing locator"))?;
                let found = transport
                    .call(
                        "findElements",
                        json!({"using": locator.strategy.as_webdriver(), "value": locator.value}),
                    )
                    .await?;
                element_refs(&found).map(CommandOutput::Elements)
            }
            Operation::Click => {
                transport.call("click", on_element(&call)?).await?;
                Ok(CommandOutput::None)
            }
            Operation::Type => {
                let text = call.require_str("text")?;
                let mut params = on_element(&call)?;
                params["text"] = json!(text);
                params["value"] = json!(text.chars().map(String::from).collect::<Vec<_>>());
                transport.call("sendKeys", params).await?;
                Ok(CommandOutput::None)
            }
            Operation::Clear => {
                transport.call("clear", on_element(&call)?).await?;
                Ok(CommandOutput::None)
            }
            Operation::GetText => {
                let text = transport.call("getText", on_element(&call)?).await?;
                text_payload("getText", text)
            }
            Operation::GetAttribute => {
                let mut params = on_element(&call)?;
                params["name"] = json!(call.require_str("name")?);
                transport.call("getAttribute", params).await.map(CommandOutput::Value)
            }
            Operation::Screenshot => {
                let encoded = match call.element {
                    Some(_) => transport.call("elementScreenshot", on_element(&call)?).await?,
                    None => transport.call("screenshot", Value::Null).await?,
                };
                let data = encoded
                    .as_str()
                    .ok_or_else(|| BackendFault::malformed("screenshot", "missing screenshot data"))?;
                base64::engine::general_purpose::STANDARD
                    .decode(data.replace(['\n', '\r'], ""))
                    .map(CommandOutput::Image)
                    .map_err(|e| BackendFault::malformed("screenshot", e.to_string()))
            }
            Operation::SwitchContext => {
                let name = call.require_str("name")?;
                transport.call("switchContext", json!({"name": name})).await?;
                Ok(CommandOutput::None)
            }
            Operation::GetContexts => {
                let contexts = transport.call("getContexts", Value::Null).await?;
                if !contexts.as_array().is_some_and(|items| items.iter().all(Value::is_string)) {
                    return Err(BackendFault::malformed(
                        "getContexts",
                        format!("expected a list of context names, got {}", contexts),
                    ));
                }
                Ok(CommandOutput::Value(contexts))
            }
            Operation::PageSource => {
                let source = transport.call("getPageSource", Value::Null).await?;
                text_payload("getPageSource", source)
            }
            Operation::Back => {
                transport.call("back", Value::Null).await?;
                Ok(CommandOutput::None)
            }
            Operation::ExecuteScript => Err(BackendFault::unsupported("execute_script")),
        }
    }
}

/// An empty target relaunches the session's app; a URL opens in the
/// device browser; anything else is an app/bundle identifier to activate.
async fn navigate(transport: &dyn BackendTransport, target: &str) -> Result<CommandOutput, BackendFault> {
    if target.is_empty() {
        transport.call("launchApp", Value::Null).await?;
    } else if target.starts_with("http://") || target.starts_with("https://") {
        transport.call("navigateTo", json!({"url": target})).await?;
    } else {
        transport
            .call("activateApp", json!({"appId": target, "bundleId": target}))
            .await?;
    }
    Ok(CommandOutput::None)
}

fn on_element(call: &HandlerCall<'_>) -> Result<Value, BackendFault> {
    Ok(json!({"element_id": call.element_ref()?}))
}

fn text_payload(method: &str, value: Value) -> Result<CommandOutput, BackendFault> {
    match value {
        Value::String(text) => Ok(CommandOutput::Text(text)),
        other => Err(BackendFault::malformed(method, format!("expected a string, got {}", other))),
    }
}

fn element_refs(found: &Value) -> Result<Vec<ElementRef>, BackendFault> {
    let items = found
        .as_array()
        .ok_or_else(|| BackendFault::malformed("findElements", "expected an array of elements"))?;
    items
        .iter()
        .map(|item| {
            item.get(ELEMENT_KEY)
                .or_else(|| item.get("ELEMENT"))
                .and_then(|id| id.as_str())
                .map(ElementRef::new)
                .ok_or_else(|| BackendFault::malformed("findElements", format!("not an element: {}", item)))
        })
        .collect()
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
