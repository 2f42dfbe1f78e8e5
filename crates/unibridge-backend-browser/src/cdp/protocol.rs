//! CDP protocol types and message definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// CDP request message.
#[derive(Debug, Serialize)]
pub struct CdpRequest {
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// CDP response or event message.
#[derive(Debug, Deserialize)]
pub struct CdpResponse {
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<CdpErrorResponse>,
    pub method: Option<String>,
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// CDP error in response.
#[derive(Debug, Deserialize)]
pub struct CdpErrorResponse {
    pub code: i64,
    pub message: String,
    pub data: Option<String>,
}

/// Browser version info from `/json/version`.
///
/// Chrome returns PascalCase field names for this endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserVersion {
    #[serde(rename = "Browser")]
    pub browser: String,
    #[serde(rename = "Protocol-Version", default)]
    pub protocol_version: String,
    #[serde(rename = "User-Agent", default)]
    pub user_agent: String,
    #[serde(rename = "webSocketDebuggerUrl")]
    pub web_socket_debugger_url: String,
}

/// Box model from `DOM.getBoxModel`.
#[derive(Debug, Clone, Deserialize)]
pub struct BoxModel {
    pub content: Vec<f64>,
    pub border: Vec<f64>,
    pub width: f64,
    pub height: f64,
}

impl BoxModel {
    /// Center of the content quad.
    pub fn center(&self) -> (f64, f64) {
        quad_center(&self.content)
    }

    /// Axis-aligned bounds of the border quad as `(x, y, width, height)`.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let xs = self.border.iter().step_by(2);
        let ys = self.border.iter().skip(1).step_by(2);
        let min_x = xs.clone().copied().fold(f64::INFINITY, f64::min);
        let max_x = xs.copied().fold(f64::NEG_INFINITY, f64::max);
        let min_y = ys.clone().copied().fold(f64::INFINITY, f64::min);
        let max_y = ys.copied().fold(f64::NEG_INFINITY, f64::max);
        if min_x.is_finite() && min_y.is_finite() {
            (min_x, min_y, max_x - min_x, max_y - min_y)
        } else {
            (0.0, 0.0, self.width, self.height)
        }
    }
}

/// Calculate center point of a quad.
pub fn quad_center(quad: &[f64]) -> (f64, f64) {
    if quad.len() >= 8 {
        let x = (quad[0] + quad[2] + quad[4] + quad[6]) / 4.0;
        let y = (quad[1] + quad[3] + quad[5] + quad[7]) / 4.0;
        (x, y)
    } else {
        (0.0, 0.0)
    }
}
