use super::*;
use std::collections::HashMap;

use parking_lot::Mutex;
use unibridge_protocols::command::Command;
use unibridge_protocols::types::{ElementState, Locator, LocatorStrategy, SessionId};

/// Transport answering CDP methods from a fixed table and recording calls.
#[derive(Default)]
struct FakeTransport {
    replies: Mutex<HashMap<String, Result<Value, FaultCode>>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl FakeTransport {
    fn reply(self, method: &str, value: Value) -> Self {
        self.replies.lock().insert(method.to_string(), Ok(value));
        self
    }

    fn fail(self, method: &str, code: FaultCode) -> Self {
        self.replies.lock().insert(method.to_string(), Err(code));
        self
    }

    fn methods(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(m, _)| m.clone()).collect()
    }

    fn params_of(&self, method: &str) -> Value {
        self.calls
            .lock()
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, p)| p.clone())
            .unwrap_or(Value::Null)
    }
}

#[async_trait]
impl BackendTransport for FakeTransport {
    async fn call(&self, method: &str, params: Value) -> Result<Value, BackendFault> {
        self.calls.lock().push((method.to_string(), params));
        match self.replies.lock().get(method) {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(code)) => Err(BackendFault::new(*code, method, "scripted failure")),
            None => Ok(json!({})),
        }
    }

    async fn close(&self) -> Result<(), BackendFault> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        true
    }
}

fn handler(operation: Operation) -> BrowserHandler {
    BrowserHandler { operation }
}

fn element(backend_ref: &str) -> ElementState {
    ElementState {
        backend_ref: backend_ref.to_string(),
        locator: Locator::css("#x"),
        cached: None,
    }
}

fn box_reply() -> Value {
    json!({"model": {
        "content": [10.0, 10.0, 30.0, 10.0, 30.0, 20.0, 10.0, 20.0],
        "border": [8.0, 8.0, 32.0, 8.0, 32.0, 22.0, 8.0, 22.0],
        "width": 24.0,
        "height": 14.0
    }})
}

#[test]
fn test_no_context_switch_handler() {
    let ops: Vec<Operation> = all().into_iter().map(|(op, _)| op).collect();
    assert!(!ops.contains(&Operation::SwitchContext));
    assert!(!ops.contains(&Operation::GetContexts));
    assert!(ops.contains(&Operation::ExecuteScript));
    assert_eq!(ops.len(), Operation::ALL.len() - 2);
}

#[tokio::test]
async fn test_find_css_resolves_backend_ids() {
    let transport = FakeTransport::default()
        .reply("DOM.getDocument", json!({"root": {"nodeId": 1}}))
        .reply("DOM.querySelectorAll", json!({"nodeIds": [5]}))
        .reply("DOM.describeNode", json!({"node": {"backendNodeId": 42}}))
        .reply("DOM.getBoxModel", box_reply());
    let cmd = Command::new(SessionId::new(), Operation::Find).with_locator(&Locator::id("login"));

    let output = handler(Operation::Find)
        .handle(&transport, HandlerCall::new(&cmd, None))
        .await
        .unwrap();
    let CommandOutput::Elements(elements) = output else {
        panic!("expected elements");
    };
    assert_eq!(elements.len(), 1);
    assert_eq!(elements[0].backend_ref, "42");
    let rect = elements[0].snapshot.as_ref().unwrap().rect.unwrap();
    assert_eq!((rect.x, rect.width), (8.0, 24.0));
    assert_eq!(transport.params_of("DOM.querySelectorAll")["selector"], "[id=\"login\"]");
}

#[tokio::test]
async fn test_find_no_match_is_empty() {
    let transport = FakeTransport::default()
        .reply("DOM.getDocument", json!({"root": {"nodeId": 1}}))
        .reply("DOM.querySelectorAll", json!({"nodeIds": []}));
    let cmd = Command::new(SessionId::new(), Operation::FindAll).with_locator(&Locator::css(".none"));

    let output = handler(Operation::FindAll)
        .handle(&transport, HandlerCall::new(&cmd, None))
        .await
        .unwrap();
    assert_eq!(output, CommandOutput::Elements(vec![]));
}

#[tokio::test]
async fn test_find_xpath_discards_search() {
    let transport = FakeTransport::default()
        .reply("DOM.getDocument", json!({"root": {"nodeId": 1}}))
        .reply("DOM.performSearch", json!({"searchId": "s1", "resultCount": 2}))
        .reply("DOM.getSearchResults", json!({"nodeIds": [7, 8]}))
        .reply("DOM.describeNode", json!({"node": {"backendNodeId": 70}}))
        .fail("DOM.getBoxModel", FaultCode::Rejected);
    let cmd = Command::new(SessionId::new(), Operation::FindAll).with_locator(&Locator::xpath("//li"));

    let output = handler(Operation::FindAll)
        .handle(&transport, HandlerCall::new(&cmd, None))
        .await
        .unwrap();
    let CommandOutput::Elements(elements) = output else {
        panic!("expected elements");
    };
    assert_eq!(elements.len(), 2);
    assert!(elements[0].snapshot.as_ref().unwrap().rect.is_none());
    assert!(transport.methods().contains(&"DOM.discardSearchResults".to_string()));
    assert_eq!(transport.params_of("DOM.getSearchResults")["toIndex"], 2);
}

#[tokio::test]
async fn test_find_mobile_strategy_rejected() {
    let transport = FakeTransport::default();
    let locator = Locator::new(LocatorStrategy::IosClassChain, "**/XCUIElementTypeButton");
    let cmd = Command::new(SessionId::new(), Operation::Find).with_locator(&locator);

    let fault = handler(Operation::Find)
        .handle(&transport, HandlerCall::new(&cmd, None))
        .await
        .unwrap_err();
    assert_eq!(fault.code, FaultCode::Rejected);
    assert!(transport.methods().is_empty());
}

#[tokio::test]
async fn test_click_dispatches_press_and_release_at_center() {
    let transport = FakeTransport::default().reply("DOM.getBoxModel", box_reply());
    let cmd = Command::new(SessionId::new(), Operation::Click);
    let state = element("42");

    handler(Operation::Click)
        .handle(&transport, HandlerCall::new(&cmd, Some(&state)))
        .await
        .unwrap();

    let mouse: Vec<Value> = transport
        .calls
        .lock()
        .iter()
        .filter(|(m, _)| m == "Input.dispatchMouseEvent")
        .map(|(_, p)| p.clone())
        .collect();
    assert_eq!(mouse.len(), 2);
    assert_eq!(mouse[0]["type"], "mousePressed");
    assert_eq!(mouse[1]["type"], "mouseReleased");
    assert_eq!(mouse[0]["x"], 20.0);
    assert_eq!(mouse[0]["y"], 15.0);
}

#[tokio::test]
async fn test_click_detached_node_is_stale() {
    let transport = FakeTransport::default().fail("DOM.scrollIntoViewIfNeeded", FaultCode::StaleElement);
    let cmd = Command::new(SessionId::new(), Operation::Click);
    let state = element("42");

    let fault = handler(Operation::Click)
        .handle(&transport, HandlerCall::new(&cmd, Some(&state)))
        .await
        .unwrap_err();
    assert_eq!(fault.code, FaultCode::StaleElement);
}

#[tokio::test]
async fn test_type_focuses_then_inserts() {
    let transport = FakeTransport::default();
    let cmd = Command::new(SessionId::new(), Operation::Type).with_param("text", "hello");
    let state = element("9");

    handler(Operation::Type)
        .handle(&transport, HandlerCall::new(&cmd, Some(&state)))
        .await
        .unwrap();
    assert_eq!(transport.methods(), vec!["DOM.focus", "Input.insertText"]);
    assert_eq!(transport.params_of("DOM.focus")["backendNodeId"], 9);
    assert_eq!(transport.params_of("Input.insertText")["text"], "hello");
}

#[tokio::test]
async fn test_get_attribute_passes_name() {
    let transport = FakeTransport::default()
        .reply("DOM.resolveNode", json!({"object": {"objectId": "obj-1"}}))
        .reply("Runtime.callFunctionOn", json!({"result": {"type": "string", "value": "submit"}}));
    let cmd = Command::new(SessionId::new(), Operation::GetAttribute).with_param("name", "type");
    let state = element("9");

    let output = handler(Operation::GetAttribute)
        .handle(&transport, HandlerCall::new(&cmd, Some(&state)))
        .await
        .unwrap();
    assert_eq!(output, CommandOutput::Value(json!("submit")));
    let params = transport.params_of("Runtime.callFunctionOn");
    assert_eq!(params["objectId"], "obj-1");
    assert_eq!(params["arguments"][0]["value"], "type");
}

#[tokio::test]
async fn test_bad_element_ref_is_malformed() {
    let transport = FakeTransport::default();
    let cmd = Command::new(SessionId::new(), Operation::GetText);
    let state = element("not-a-node");

    let fault = handler(Operation::GetText)
        .handle(&transport, HandlerCall::new(&cmd, Some(&state)))
        .await
        .unwrap_err();
    assert_eq!(fault.code, FaultCode::Malformed);
}

#[tokio::test]
async fn test_execute_script_wraps_arguments() {
    let transport = FakeTransport::default()
        .reply("Runtime.evaluate", json!({"result": {"type": "number", "value": 3}}));
    let cmd = Command::new(SessionId::new(), Operation::ExecuteScript)
        .with_param("script", "return arguments[0] + arguments[1];")
        .with_param("args", json!([1, 2]));

    let output = handler(Operation::ExecuteScript)
        .handle(&transport, HandlerCall::new(&cmd, None))
        .await
        .unwrap();
    assert_eq!(output, CommandOutput::Value(json!(3)));
    assert_eq!(
        transport.params_of("Runtime.evaluate")["expression"],
        "(function() { return arguments[0] + arguments[1]; }).apply(null, [1,2])"
    );
}

#[tokio::test]
async fn test_script_exception_is_rejected() {
    let transport = FakeTransport::default().reply(
        "Runtime.evaluate",
        json!({"result": {"type": "object"}, "exceptionDetails": {"text": "Uncaught", "exception": {"description": "ReferenceError: foo is not defined"}}}),
    );
    let cmd = Command::new(SessionId::new(), Operation::ExecuteScript).with_param("script", "foo()");

    let fault = handler(Operation::ExecuteScript)
        .handle(&transport, HandlerCall::new(&cmd, None))
        .await
        .unwrap_err();
    assert_eq!(fault.code, FaultCode::Rejected);
    assert!(fault.message.contains("ReferenceError"));
}

#[tokio::test]
async fn test_navigate_error_text() {
    let transport = FakeTransport::default()
        .reply("Page.navigate", json!({"frameId": "F", "errorText": "net::ERR_NAME_NOT_RESOLVED"}));
    let cmd = Command::new(SessionId::new(), Operation::Navigate).with_param("target", "https://nope.invalid");

    let fault = handler(Operation::Navigate)
        .handle(&transport, HandlerCall::new(&cmd, None))
        .await
        .unwrap_err();
    assert_eq!(fault.code, FaultCode::Rejected);
    assert!(fault.message.contains("ERR_NAME_NOT_RESOLVED"));
}

#[tokio::test]
async fn test_navigate_waits_for_ready_state() {
    let transport = FakeTransport::default()
        .reply("Page.navigate", json!({"frameId": "F"}))
        .reply("Runtime.evaluate", json!({"result": {"type": "string", "value": "complete"}}));
    let cmd = Command::new(SessionId::new(), Operation::Navigate).with_param("target", "https://example.com");

    handler(Operation::Navigate)
        .handle(&transport, HandlerCall::new(&cmd, None))
        .await
        .unwrap();
    assert_eq!(transport.methods(), vec!["Page.navigate", "Runtime.evaluate"]);
}

#[tokio::test]
async fn test_element_screenshot_clips_to_bounds() {
    let png = base64::engine::general_purpose::STANDARD.encode(b"\x89PNG");
    let transport = FakeTransport::default()
        .reply("DOM.getBoxModel", box_reply())
        .reply("Page.captureScreenshot", json!({"data": png}));
    let cmd = Command::new(SessionId::new(), Operation::Screenshot);
    let state = element("42");

    let output = handler(Operation::Screenshot)
        .handle(&transport, HandlerCall::new(&cmd, Some(&state)))
        .await
        .unwrap();
    assert_eq!(output, CommandOutput::Image(b"\x89PNG".to_vec()));
    let clip = &transport.params_of("Page.captureScreenshot")["clip"];
    assert_eq!(clip["width"], 24.0);
    assert_eq!(clip["height"], 14.0);
}

#[tokio::test]
async fn test_back_at_first_entry_is_noop() {
    let transport = FakeTransport::default()
        .reply("Page.getNavigationHistory", json!({"currentIndex": 0, "entries": [{"id": 1}]}));
    let cmd = Command::new(SessionId::new(), Operation::Back);

    handler(Operation::Back)
        .handle(&transport, HandlerCall::new(&cmd, None))
        .await
        .unwrap();
    assert_eq!(transport.methods(), vec!["Page.getNavigationHistory"]);
}

#[tokio::test]
async fn test_back_navigates_to_previous_entry() {
    let transport = FakeTransport::default().reply(
        "Page.getNavigationHistory",
        json!({"currentIndex": 2, "entries": [{"id": 1}, {"id": 4}, {"id": 9}]}),
    );
    let cmd = Command::new(SessionId::new(), Operation::Back);

    handler(Operation::Back)
        .handle(&transport, HandlerCall::new(&cmd, None))
        .await
        .unwrap();
    assert_eq!(transport.params_of("Page.navigateToHistoryEntry")["entryId"], 4);
}

#[tokio::test]
async fn test_find_describes_only_first_match() {
    let transport = FakeTransport::default()
        .reply("DOM.getDocument", json!({"root": {"nodeId": 1}}))
        .reply("DOM.querySelectorAll", json!({"nodeIds": [5, 6, 7]}))
        .reply("DOM.describeNode", json!({"node": {"backendNodeId": 50}}))
        .reply("DOM.getBoxModel", box_reply());
    let cmd = Command::new(SessionId::new(), Operation::Find).with_locator(&Locator::css("li"));

    let output = handler(Operation::Find)
        .handle(&transport, HandlerCall::new(&cmd, None))
        .await
        .unwrap();
    let CommandOutput::Elements(elements) = output else {
        panic!("expected elements");
    };
    assert_eq!(elements.len(), 1);
    let described = transport.methods().iter().filter(|m| *m == "DOM.describeNode").count();
    assert_eq!(described, 1);
    assert_eq!(transport.params_of("DOM.describeNode")["nodeId"], 5);
}

#[tokio::test]
async fn test_find_without_node_ids_is_malformed() {
    let transport = FakeTransport::default()
        .reply("DOM.getDocument", json!({"root": {"nodeId": 1}}))
        .reply("DOM.querySelectorAll", json!({"unexpected": true}));
    let cmd = Command::new(SessionId::new(), Operation::FindAll).with_locator(&Locator::css("li"));

    let fault = handler(Operation::FindAll)
        .handle(&transport, HandlerCall::new(&cmd, None))
        .await
        .unwrap_err();
    assert_eq!(fault.code, FaultCode::Malformed);
    assert_eq!(fault.method, "DOM.querySelectorAll");
}

#[tokio::test]
async fn test_xpath_search_without_count_is_malformed() {
    let transport = FakeTransport::default()
        .reply("DOM.getDocument", json!({"root": {"nodeId": 1}}))
        .reply("DOM.performSearch", json!({"searchId": "s1"}));
    let cmd = Command::new(SessionId::new(), Operation::FindAll).with_locator(&Locator::xpath("//li"));

    let fault = handler(Operation::FindAll)
        .handle(&transport, HandlerCall::new(&cmd, None))
        .await
        .unwrap_err();
    assert_eq!(fault.code, FaultCode::Malformed);
    assert!(!transport.methods().contains(&"DOM.getSearchResults".to_string()));
}

#[tokio::test]
async fn test_non_string_text_is_malformed() {
    let transport = FakeTransport::default()
        .reply("DOM.resolveNode", json!({"object": {"objectId": "obj-1"}}))
        .reply("Runtime.callFunctionOn", json!({"result": {"type": "object", "value": {"a": 1}}}))
        .reply("Runtime.evaluate", json!({"result": {"type": "number", "value": 12345}}));
    let state = element("9");

    let cmd = Command::new(SessionId::new(), Operation::GetText);
    let fault = handler(Operation::GetText)
        .handle(&transport, HandlerCall::new(&cmd, Some(&state)))
        .await
        .unwrap_err();
    assert_eq!(fault.code, FaultCode::Malformed);

    let cmd = Command::new(SessionId::new(), Operation::PageSource);
    let fault = handler(Operation::PageSource)
        .handle(&transport, HandlerCall::new(&cmd, None))
        .await
        .unwrap_err();
    assert_eq!(fault.code, FaultCode::Malformed);
}

#[tokio::test]
async fn test_script_reply_without_result_is_malformed() {
    let transport = FakeTransport::default().reply("Runtime.evaluate", json!({}));
    let cmd = Command::new(SessionId::new(), Operation::ExecuteScript).with_param("script", "return 1;");

    let fault = handler(Operation::ExecuteScript)
        .handle(&transport, HandlerCall::new(&cmd, None))
        .await
        .unwrap_err();
    assert_eq!(fault.code, FaultCode::Malformed);
}

#[tokio::test]
async fn test_back_without_history_index_is_malformed() {
    let transport = FakeTransport::default()
        .reply("Page.getNavigationHistory", json!({"entries": [{"id": 1}, {"id": 2}]}));
    let cmd = Command::new(SessionId::new(), Operation::Back);

    let fault = handler(Operation::Back)
        .handle(&transport, HandlerCall::new(&cmd, None))
        .await
        .unwrap_err();
    assert_eq!(fault.code, FaultCode::Malformed);
    assert_eq!(transport.methods(), vec!["Page.getNavigationHistory"]);
}
