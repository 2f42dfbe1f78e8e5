//! Parsing provider text into structured facade results.
//!
//! Every parser is strict: text that does not have the expected shape is a
//! [`BridgeError::ProviderResponse`], never a best-guess result.

use serde_json::{Map, Value};

use unibridge_protocols::command::{Operation, PlannedStep};
use unibridge_protocols::error::BridgeError;
use unibridge_protocols::types::{Locator, LocatorStrategy};

use super::{AppStructure, ScriptLanguage};

/// Parameter names that describe the target element rather than the action.
const LOCATOR_KEYS: &[&str] = &["by", "strategy", "using", "value", "locator", "element_id"];

fn invalid(message: impl Into<String>) -> BridgeError {
    BridgeError::provider_response(message)
}

/// Parse the JSON document in `text`, tolerating a surrounding code fence or
/// prose before and after the document.
pub fn extract_json(text: &str) -> Result<Value, BridgeError> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    if let Some(block) = fenced_blocks(trimmed).into_iter().next() {
        if let Ok(value) = serde_json::from_str(block.body.trim()) {
            return Ok(value);
        }
    }

    let start = trimmed.find(['{', '[']);
    let end = trimmed.rfind(['}', ']']);
    if let (Some(start), Some(end)) = (start, end) {
        if start < end {
            let candidate = &trimmed[start..=end];
            return serde_json::from_str(candidate).map_err(|e| {
                invalid(format!("response is not valid JSON: {}", e)).with_cause(e)
            });
        }
    }

    Err(invalid(format!(
        "response does not contain JSON: {}",
        preview(trimmed)
    )))
}

fn preview(text: &str) -> String {
    let head: String = text.chars().take(120).collect();
    if head.len() < text.len() {
        format!("{}...", head)
    } else {
        head
    }
}

/// Map an interpreted action name onto a unified operation.
pub fn operation_for_action(action: &str) -> Option<Operation> {
    let normalized = action.trim().to_ascii_lowercase().replace(['-', ' '], "_");
    let operation = match normalized.as_str() {
        "find" | "find_element" | "locate" => Operation::Find,
        "find_all" | "find_elements" => Operation::FindAll,
        "click" | "click_element" | "tap" | "press" => Operation::Click,
        "type" | "send_keys" | "input" | "enter_text" | "set_value" => Operation::Type,
        "clear" | "clear_element" => Operation::Clear,
        "get_text" | "read_text" => Operation::GetText,
        "get_attribute" => Operation::GetAttribute,
        "execute_script" | "execute" => Operation::ExecuteScript,
        "screenshot" | "take_screenshot" => Operation::Screenshot,
        "switch_context" | "switch_to_context" => Operation::SwitchContext,
        "get_contexts" | "list_contexts" => Operation::GetContexts,
        "page_source" | "get_page_source" => Operation::PageSource,
        "back" | "go_back" | "navigate_back" => Operation::Back,
        "navigate" | "open" | "open_url" | "get" | "launch_app" | "activate_app" => {
            Operation::Navigate
        }
        _ => return None,
    };
    Some(operation)
}

/// Parse an `interpret_command` answer into planned steps.
///
/// Accepts `{"steps": [..]}`, a bare array of steps, or a single
/// `{"action": .., "parameters": ..}` object. An empty plan is an error.
pub fn parse_steps(text: &str) -> Result<Vec<PlannedStep>, BridgeError> {
    let document = extract_json(text)?;
    let items = match document {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("steps") {
            Some(Value::Array(items)) => items,
            Some(_) => return Err(invalid("'steps' is not an array")),
            None if object.contains_key("action") => vec![Value::Object(object)],
            None => return Err(invalid("response has neither 'steps' nor 'action'")),
        },
        _ => return Err(invalid("response is not a JSON object or array")),
    };

    if items.is_empty() {
        return Err(invalid("interpretation produced no steps"));
    }

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            parse_step(item).map_err(|e| invalid(format!("step {}: {}", index + 1, e.message())))
        })
        .collect()
}

fn parse_step(item: Value) -> Result<PlannedStep, BridgeError> {
    let Value::Object(mut object) = item else {
        return Err(invalid("step is not an object"));
    };

    let action = object
        .get("action")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("missing 'action'"))?;
    let operation =
        operation_for_action(action).ok_or_else(|| invalid(format!("unknown action '{}'", action)))?;

    let mut parameters = match object.remove("parameters").or_else(|| object.remove("params")) {
        Some(Value::Object(map)) => map,
        Some(Value::Null) | None => Map::new(),
        Some(_) => return Err(invalid("'parameters' is not an object")),
    };

    let locator = match object.remove("locator") {
        Some(Value::Object(map)) => Some(parse_locator(&map)?),
        Some(Value::Null) | None => locator_from_parameters(&parameters)?,
        Some(_) => return Err(invalid("'locator' is not an object")),
    };

    for key in LOCATOR_KEYS {
        parameters.remove(*key);
    }
    normalize_parameters(operation, &mut parameters);

    let mut step = PlannedStep::new(operation);
    step.locator = locator;
    step.params = parameters;
    Ok(step)
}

fn parse_locator(map: &Map<String, Value>) -> Result<Locator, BridgeError> {
    let strategy = ["strategy", "by", "using"]
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str))
        .ok_or_else(|| invalid("locator has no strategy"))?;
    let value = map
        .get("value")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("locator has no value"))?;

    let strategy: LocatorStrategy = strategy.parse().map_err(|e: String| invalid(e))?;
    Ok(Locator::new(strategy, value))
}

/// The original single-action shape carries `by`/`value` inside parameters.
fn locator_from_parameters(parameters: &Map<String, Value>) -> Result<Option<Locator>, BridgeError> {
    let has_strategy = ["strategy", "by", "using"]
        .iter()
        .any(|key| parameters.contains_key(*key));
    if !has_strategy {
        return Ok(None);
    }
    parse_locator(parameters).map(Some)
}

fn normalize_parameters(operation: Operation, parameters: &mut Map<String, Value>) {
    let rename = |parameters: &mut Map<String, Value>, from: &str, to: &str| {
        if !parameters.contains_key(to) {
            if let Some(value) = parameters.remove(from) {
                parameters.insert(to.to_string(), value);
            }
        }
    };

    match operation {
        Operation::SwitchContext => rename(parameters, "context_name", "name"),
        Operation::GetAttribute => rename(parameters, "attribute", "name"),
        Operation::Navigate => {
            rename(parameters, "url", "target");
            rename(parameters, "app_id", "target");
        }
        Operation::Type => rename(parameters, "value_to_type", "text"),
        _ => {}
    }
}

/// Parse a `suggest_test_actions` answer: a JSON array of strings, or an
/// object holding one under `suggestions`.
pub fn parse_suggestions(text: &str) -> Result<Vec<String>, BridgeError> {
    let items = match extract_json(text)? {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("suggestions") {
            Some(Value::Array(items)) => items,
            _ => return Err(invalid("response has no 'suggestions' array")),
        },
        _ => return Err(invalid("response is not a JSON array")),
    };

    let suggestions = items
        .into_iter()
        .map(|item| match item {
            Value::String(text) => Ok(text),
            other => Err(invalid(format!("suggestion is not a string: {}", other))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if suggestions.is_empty() {
        return Err(invalid("response contains no suggestions"));
    }
    Ok(suggestions)
}

pub fn parse_structure(text: &str) -> Result<AppStructure, BridgeError> {
    let document = extract_json(text)?;
    if !document.is_object() {
        return Err(invalid("app structure is not a JSON object"));
    }
    serde_json::from_value(document)
        .map_err(|e| invalid(format!("app structure has the wrong shape: {}", e)).with_cause(e))
}

/// One fenced code block.
#[derive(Debug, PartialEq)]
pub struct FencedBlock<'a> {
    pub tag: &'a str,
    pub body: &'a str,
}

/// All complete ```` ``` ```` fenced blocks in `text`, in order.
pub fn fenced_blocks(text: &str) -> Vec<FencedBlock<'_>> {
    let mut blocks = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("```") {
        let after_open = &rest[open + 3..];
        let (tag, body_start) = match after_open.find('\n') {
            Some(newline) => (after_open[..newline].trim(), newline + 1),
            None => break,
        };
        let body_and_rest = &after_open[body_start..];
        let Some(close) = body_and_rest.find("```") else {
            break;
        };
        blocks.push(FencedBlock {
            tag,
            body: &body_and_rest[..close],
        });
        rest = &body_and_rest[close + 3..];
    }

    blocks
}

/// Extract the script from a `generate_test_script` answer: the first block
/// tagged with the language, else the first fenced block, else the whole text.
pub fn extract_script(text: &str, language: ScriptLanguage) -> Result<String, BridgeError> {
    let blocks = fenced_blocks(text);
    let tags = language.fence_tags();

    let code = blocks
        .iter()
        .find(|block| tags.iter().any(|tag| block.tag.eq_ignore_ascii_case(tag)))
        .or_else(|| blocks.first())
        .map(|block| block.body)
        .unwrap_or(text)
        .trim();

    if code.is_empty() {
        return Err(invalid("response contains no script"));
    }
    Ok(code.to_string())
}

#[cfg(test)]
#[path = "parse_tests.rs"]
mod tests;
