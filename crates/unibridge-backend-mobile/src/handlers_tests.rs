use super::*;
use std::collections::HashMap;

use parking_lot::Mutex;
use unibridge_protocols::command::Command;
use unibridge_protocols::types::{ElementState, Locator, LocatorStrategy, SessionId};

/// Transport answering WebDriver commands from a fixed table and recording calls.
#[derive(Default)]
struct FakeTransport {
    replies: Mutex<HashMap<String, Result<Value, FaultCode>>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl FakeTransport {
    fn reply(self, command: &str, value: Value) -> Self {
        self.replies.lock().insert(command.to_string(), Ok(value));
        self
    }

    fn fail(self, command: &str, code: FaultCode) -> Self {
        self.replies.lock().insert(command.to_string(), Err(code));
        self
    }

    fn commands(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(c, _)| c.clone()).collect()
    }

    fn params_of(&self, command: &str) -> Value {
        self.calls
            .lock()
            .iter()
            .find(|(c, _)| c == command)
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
            None => Ok(Value::Null),
        }
    }

    async fn close(&self) -> Result<(), BackendFault> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        true
    }
}

fn handler(operation: Operation) -> MobileHandler {
    MobileHandler { operation }
}

fn element(backend_ref: &str) -> ElementState {
    ElementState {
        backend_ref: backend_ref.to_string(),
        locator: Locator::accessibility_id("login"),
        cached: None,
    }
}

#[test]
fn test_no_script_handler() {
    let ops: Vec<Operation> = all().into_iter().map(|(op, _)| op).collect();
    assert!(!ops.contains(&Operation::ExecuteScript));
    assert!(ops.contains(&Operation::SwitchContext));
    assert_eq!(ops.len(), Operation::ALL.len() - 1);
}

#[tokio::test]
async fn test_find_reads_both_element_keys() {
    let transport = FakeTransport::default().reply(
        "findElements",
        json!([{ELEMENT_KEY: "el-1"}, {"ELEMENT": "el-2"}]),
    );
    let cmd = Command::new(SessionId::new(), Operation::FindAll)
        .with_locator(&Locator::new(LocatorStrategy::AndroidUiAutomator, "new UiSelector().text(\"OK\")"));

    let out = handler(Operation::FindAll)
        .handle(&transport, HandlerCall::new(&cmd, None))
        .await
        .unwrap();
    let CommandOutput::Elements(found) = out else {
        panic!("expected elements, got {:?}", out);
    };
    let refs: Vec<&str> = found.iter().map(|e| e.backend_ref.as_str()).collect();
    assert_eq!(refs, vec!["el-1", "el-2"]);
    assert_eq!(
        transport.params_of("findElements"),
        json!({"using": "-android uiautomator", "value": "new UiSelector().text(\"OK\")"})
    );
}

#[tokio::test]
async fn test_find_rejects_non_elements() {
    let transport = FakeTransport::default().reply("findElements", json!([{"id": 3}]));
    let cmd = Command::new(SessionId::new(), Operation::Find).with_locator(&Locator::id("ok"));
    let fault = handler(Operation::Find)
        .handle(&transport, HandlerCall::new(&cmd, None))
        .await
        .unwrap_err();
    assert_eq!(fault.code, FaultCode::Malformed);
}

#[tokio::test]
async fn test_type_sends_text_and_chars() {
    let transport = FakeTransport::default();
    let cmd = Command::new(SessionId::new(), Operation::Type).with_param("text", "hi");
    let state = element("el-7");
    handler(Operation::Type)
        .handle(&transport, HandlerCall::new(&cmd, Some(&state)))
        .await
        .unwrap();
    assert_eq!(
        transport.params_of("sendKeys"),
        json!({"element_id": "el-7", "text": "hi", "value": ["h", "i"]})
    );
}

#[tokio::test]
async fn test_get_attribute_passes_name() {
    let transport = FakeTransport::default().reply("getAttribute", json!("true"));
    let cmd = Command::new(SessionId::new(), Operation::GetAttribute).with_param("name", "checked");
    let state = element("el-1");
    let out = handler(Operation::GetAttribute)
        .handle(&transport, HandlerCall::new(&cmd, Some(&state)))
        .await
        .unwrap();
    assert!(matches!(out, CommandOutput::Value(ref v) if v == "true"));
    assert_eq!(transport.params_of("getAttribute")["name"], "checked");
}

#[tokio::test]
async fn test_stale_click_propagates() {
    let transport = FakeTransport::default().fail("click", FaultCode::StaleElement);
    let cmd = Command::new(SessionId::new(), Operation::Click);
    let state = element("el-1");
    let fault = handler(Operation::Click)
        .handle(&transport, HandlerCall::new(&cmd, Some(&state)))
        .await
        .unwrap_err();
    assert_eq!(fault.code, FaultCode::StaleElement);
}

#[tokio::test]
async fn test_navigate_targets() {
    let cases = [
        ("", "launchApp"),
        ("https://example.com", "navigateTo"),
        ("com.example.app", "activateApp"),
    ];
    for (target, expected) in cases {
        let transport = FakeTransport::default();
        let cmd = Command::new(SessionId::new(), Operation::Navigate).with_param("target", target);
        handler(Operation::Navigate)
            .handle(&transport, HandlerCall::new(&cmd, None))
            .await
            .unwrap();
        assert_eq!(transport.commands(), vec![expected.to_string()], "target {:?}", target);
    }
}

#[tokio::test]
async fn test_screenshot_decodes_page_and_element() {
    // "PNG" in base64, wrapped the way some drivers do.
    let transport = FakeTransport::default()
        .reply("screenshot", json!("UE5H\n"))
        .reply("elementScreenshot", json!("UE5H"));

    let cmd = Command::new(SessionId::new(), Operation::Screenshot);
    let out = handler(Operation::Screenshot)
        .handle(&transport, HandlerCall::new(&cmd, None))
        .await
        .unwrap();
    assert!(matches!(out, CommandOutput::Image(ref bytes) if bytes == b"PNG"));

    let state = element("el-3");
    handler(Operation::Screenshot)
        .handle(&transport, HandlerCall::new(&cmd, Some(&state)))
        .await
        .unwrap();
    assert_eq!(transport.params_of("elementScreenshot"), json!({"element_id": "el-3"}));
}

#[tokio::test]
async fn test_bad_screenshot_is_malformed() {
    let transport = FakeTransport::default().reply("screenshot", json!("***"));
    let cmd = Command::new(SessionId::new(), Operation::Screenshot);
    let fault = handler(Operation::Screenshot)
        .handle(&transport, HandlerCall::new(&cmd, None))
        .await
        .unwrap_err();
    assert_eq!(fault.code, FaultCode::Malformed);
}

#[tokio::test]
async fn test_switch_context() {
    let transport = FakeTransport::default();
    let cmd = Command::new(SessionId::new(), Operation::SwitchContext).with_param("name", "WEBVIEW_1");
    handler(Operation::SwitchContext)
        .handle(&transport, HandlerCall::new(&cmd, None))
        .await
        .unwrap();
    assert_eq!(transport.params_of("switchContext"), json!({"name": "WEBVIEW_1"}));
}

#[tokio::test]
async fn test_text_payloads_must_be_strings() {
    let transport = FakeTransport::default()
        .reply("getText", json!({"unexpected": true}))
        .reply("getPageSource", json!(12345));
    let state = element("el-1");

    let cmd = Command::new(SessionId::new(), Operation::GetText);
    let fault = handler(Operation::GetText)
        .handle(&transport, HandlerCall::new(&cmd, Some(&state)))
        .await
        .unwrap_err();
    assert_eq!(fault.code, FaultCode::Malformed);
    assert_eq!(fault.method, "getText");

    let cmd = Command::new(SessionId::new(), Operation::PageSource);
    let fault = handler(Operation::PageSource)
        .handle(&transport, HandlerCall::new(&cmd, None))
        .await
        .unwrap_err();
    assert_eq!(fault.code, FaultCode::Malformed);
}

#[tokio::test]
async fn test_empty_text_is_still_text() {
    let transport = FakeTransport::default().reply("getText", json!(""));
    let cmd = Command::new(SessionId::new(), Operation::GetText);
    let state = element("el-1");
    let out = handler(Operation::GetText)
        .handle(&transport, HandlerCall::new(&cmd, Some(&state)))
        .await
        .unwrap();
    assert!(matches!(out, CommandOutput::Text(ref t) if t.is_empty()));
}

#[tokio::test]
async fn test_get_contexts_lists_names() {
    let transport = FakeTransport::default().reply("getContexts", json!(["NATIVE_APP", "WEBVIEW_1"]));
    let cmd = Command::new(SessionId::new(), Operation::GetContexts);
    let out = handler(Operation::GetContexts)
        .handle(&transport, HandlerCall::new(&cmd, None))
        .await
        .unwrap();
    assert_eq!(out, CommandOutput::Value(json!(["NATIVE_APP", "WEBVIEW_1"])));

    let transport = FakeTransport::default().reply("getContexts", json!("NATIVE_APP"));
    let fault = handler(Operation::GetContexts)
        .handle(&transport, HandlerCall::new(&cmd, None))
        .await
        .unwrap_err();
    assert_eq!(fault.code, FaultCode::Malformed);
}
