//! Scriptable screen state shared by simulated sessions.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde_json::{Value, json};

use unibridge_protocols::error::{BackendFault, FaultCode};
use unibridge_protocols::types::{Locator, Rect};

/// 1x1 transparent PNG returned for every capture.
const BLANK_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// An element on the simulated screen.
#[derive(Debug, Clone)]
pub struct SimElement {
    pub locator: Locator,
    pub text: String,
    pub attributes: HashMap<String, String>,
    pub rect: Rect,
}

impl SimElement {
    pub fn new(locator: Locator, text: impl Into<String>) -> Self {
        Self {
            locator,
            text: text.into(),
            attributes: HashMap::new(),
            rect: Rect {
                x: 0.0,
                y: 0.0,
                width: 100.0,
                height: 40.0,
            },
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.rect.x = x;
        self.rect.y = y;
        self
    }
}

struct Slot {
    backend_ref: String,
    element: SimElement,
    attached: bool,
}

struct ScreenState {
    slots: Vec<Slot>,
    pending: Vec<(u32, SimElement)>,
    next_ref: u64,
    location: Option<String>,
    history: Vec<String>,
    contexts: Vec<String>,
    context: String,
    clicks: Vec<String>,
    script_result: Value,
    calls: u64,
    connected: bool,
    reachable: bool,
    reject_capabilities: bool,
}

/// Mutable, shareable state behind simulated sessions.
pub struct SimulatedScreen {
    state: Mutex<ScreenState>,
}

impl SimulatedScreen {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ScreenState {
                slots: Vec::new(),
                pending: Vec::new(),
                next_ref: 0,
                location: None,
                history: Vec::new(),
                contexts: vec!["NATIVE_APP".to_string()],
                context: "NATIVE_APP".to_string(),
                clicks: Vec::new(),
                script_result: Value::Null,
                calls: 0,
                connected: false,
                reachable: true,
                reject_capabilities: false,
            }),
        }
    }

    /// A login form used by the CLI's simulation mode.
    pub fn login_form() -> Self {
        let screen = Self::new();
        screen.add(
            SimElement::new(Locator::id("username"), "")
                .with_attribute("class", "android.widget.EditText")
                .at(40.0, 200.0),
        );
        screen.add(
            SimElement::new(Locator::id("password"), "")
                .with_attribute("class", "android.widget.EditText")
                .with_attribute("password", "true")
                .at(40.0, 260.0),
        );
        screen.add(
            SimElement::new(Locator::accessibility_id("Login"), "Login")
                .with_attribute("class", "android.widget.Button")
                .at(40.0, 340.0),
        );
        screen
    }

    /// Place an element on screen; returns its backend reference.
    pub fn add(&self, element: SimElement) -> String {
        let mut state = self.state.lock();
        Self::insert(&mut state, element)
    }

    /// Place an element on screen after `probes` more locate queries.
    pub fn add_after(&self, probes: u32, element: SimElement) {
        self.state.lock().pending.push((probes, element));
    }

    /// Detach every element matching `locator`; existing references go stale.
    pub fn detach(&self, locator: &Locator) {
        let mut state = self.state.lock();
        for slot in state.slots.iter_mut().filter(|s| &s.element.locator == locator) {
            slot.attached = false;
        }
    }

    pub fn add_context(&self, name: impl Into<String>) {
        self.state.lock().contexts.push(name.into());
    }

    pub fn set_script_result(&self, value: Value) {
        self.state.lock().script_result = value;
    }

    /// Drop the connection as if the engine went away.
    pub fn disconnect(&self) {
        self.state.lock().connected = false;
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.state.lock().reachable = reachable;
    }

    pub fn set_reject_capabilities(&self, reject: bool) {
        self.state.lock().reject_capabilities = reject;
    }

    /// Number of backend calls received so far.
    pub fn call_count(&self) -> u64 {
        self.state.lock().calls
    }

    /// Backend references clicked so far, in order.
    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().clicks.clone()
    }

    pub fn location(&self) -> Option<String> {
        self.state.lock().location.clone()
    }

    pub fn context(&self) -> String {
        self.state.lock().context.clone()
    }

    /// Current text of the element behind `backend_ref`.
    pub fn text_of(&self, backend_ref: &str) -> Option<String> {
        let state = self.state.lock();
        state
            .slots
            .iter()
            .find(|s| s.backend_ref == backend_ref)
            .map(|s| s.element.text.clone())
    }

    pub(crate) fn connect(&self) -> Result<(), BackendFault> {
        let mut state = self.state.lock();
        if !state.reachable {
            return Err(BackendFault::new(
                FaultCode::Unreachable,
                "connect",
                "simulated endpoint is unreachable",
            ));
        }
        if state.reject_capabilities {
            return Err(BackendFault::new(
                FaultCode::Rejected,
                "connect",
                "capabilities rejected",
            ));
        }
        state.connected = true;
        Ok(())
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    fn insert(state: &mut ScreenState, element: SimElement) -> String {
        state.next_ref += 1;
        let backend_ref = format!("sim-{}", state.next_ref);
        state.slots.push(Slot {
            backend_ref: backend_ref.clone(),
            element,
            attached: true,
        });
        backend_ref
    }

    /// Handle one backend call.
    pub(crate) fn call(&self, method: &str, params: &Value) -> Result<Value, BackendFault> {
        let mut state = self.state.lock();
        state.calls += 1;
        if !state.connected {
            return Err(BackendFault::new(
                FaultCode::Disconnected,
                method,
                "simulated connection is closed",
            ));
        }

        let str_param = |name: &str| params.get(name).and_then(|v| v.as_str()).unwrap_or("");

        match method {
            "find" | "find_all" => {
                Self::tick_pending(&mut state);
                let strategy = str_param("strategy");
                let value = str_param("value");
                let matches = state
                    .slots
                    .iter()
                    .filter(|s| {
                        s.attached
                            && s.element.locator.strategy.as_webdriver() == strategy
                            && s.element.locator.value == value
                    })
                    .map(|s| {
                        json!({
                            "ref": s.backend_ref,
                            "text": s.element.text,
                            "rect": s.element.rect,
                        })
                    });
                let found: Vec<Value> = if method == "find" {
                    matches.take(1).collect()
                } else {
                    matches.collect()
                };
                Ok(Value::Array(found))
            }
            "click" => {
                let backend_ref = Self::attached(&state, method, str_param("ref"))?.backend_ref.clone();
                state.clicks.push(backend_ref);
                Ok(Value::Null)
            }
            "type" => {
                let text = str_param("text").to_string();
                let slot = Self::attached_mut(&mut state, method, str_param("ref"))?;
                slot.element.text.push_str(&text);
                Ok(Value::Null)
            }
            "clear" => {
                Self::attached_mut(&mut state, method, str_param("ref"))?.element.text.clear();
                Ok(Value::Null)
            }
            "get_text" => {
                let slot = Self::attached(&state, method, str_param("ref"))?;
                Ok(Value::String(slot.element.text.clone()))
            }
            "get_attribute" => {
                let slot = Self::attached(&state, method, str_param("ref"))?;
                Ok(slot
                    .element
                    .attributes
                    .get(str_param("name"))
                    .map(|v| Value::String(v.clone()))
                    .unwrap_or(Value::Null))
            }
            "screenshot" => {
                if let Some(backend_ref) = params.get("ref").and_then(|v| v.as_str()) {
                    Self::attached(&state, method, backend_ref)?;
                }
                Ok(json!(BLANK_PNG))
            }
            "navigate" => {
                let target = str_param("target").to_string();
                if let Some(previous) = state.location.replace(target) {
                    state.history.push(previous);
                }
                Ok(Value::Null)
            }
            "back" => {
                let previous = state.history.pop();
                state.location = previous;
                Ok(Value::Null)
            }
            "execute_script" => Ok(state.script_result.clone()),
            "switch_context" => {
                let name = str_param("name").to_string();
                if !state.contexts.contains(&name) {
                    return Err(BackendFault::new(
                        FaultCode::Rejected,
                        method,
                        format!("no such context: {}", name),
                    ));
                }
                state.context = name;
                Ok(Value::Null)
            }
            "get_contexts" => Ok(json!(state.contexts)),
            "page_source" => Ok(Value::String(Self::render_source(&state))),
            other => Err(BackendFault::unsupported(other)),
        }
    }

    fn tick_pending(state: &mut ScreenState) {
        let mut ready = Vec::new();
        state.pending.retain_mut(|(probes, element)| {
            if *probes == 0 {
                ready.push(element.clone());
                false
            } else {
                *probes -= 1;
                true
            }
        });
        for element in ready {
            Self::insert(state, element);
        }
    }

    fn attached<'a>(state: &'a ScreenState, method: &str, backend_ref: &str) -> Result<&'a Slot, BackendFault> {
        match state.slots.iter().find(|s| s.backend_ref == backend_ref) {
            Some(slot) if slot.attached => Ok(slot),
            _ => Err(BackendFault::new(
                FaultCode::StaleElement,
                method,
                format!("element {} is not attached", backend_ref),
            )),
        }
    }

    fn attached_mut<'a>(
        state: &'a mut ScreenState,
        method: &str,
        backend_ref: &str,
    ) -> Result<&'a mut Slot, BackendFault> {
        match state.slots.iter_mut().find(|s| s.backend_ref == backend_ref) {
            Some(slot) if slot.attached => Ok(slot),
            _ => Err(BackendFault::new(
                FaultCode::StaleElement,
                method,
                format!("element {} is not attached", backend_ref),
            )),
        }
    }

    fn render_source(state: &ScreenState) -> String {
        let mut xml = String::from("<hierarchy>\n");
        for slot in state.slots.iter().filter(|s| s.attached) {
            let mut attributes: Vec<_> = slot.element.attributes.iter().collect();
            attributes.sort();
            let extra: String = attributes
                .into_iter()
                .map(|(k, v)| format!(" {}=\"{}\"", k, v))
                .collect();
            xml.push_str(&format!(
                "  <node {}=\"{}\" text=\"{}\"{} />\n",
                slot.element.locator.strategy.as_webdriver().replace(' ', "-"),
                slot.element.locator.value,
                slot.element.text,
                extra
            ));
        }
        xml.push_str("</hierarchy>");
        xml
    }
}

impl Default for SimulatedScreen {
    fn default() -> Self {
        Self::new()
    }
}
