//! W3C WebDriver error codes.

use unibridge_protocols::error::FaultCode;

/// Map a W3C `error` code onto a backend fault code.
pub fn fault_code(error: &str) -> FaultCode {
    match error {
        "no such element" => FaultCode::NoSuchElement,
        "stale element reference" | "no such shadow root" | "detached shadow root" => {
            FaultCode::StaleElement
        }
        "invalid session id" => FaultCode::InvalidSession,
        "timeout" | "script timeout" => FaultCode::Timeout,
        "unknown command" | "unknown method" | "unsupported operation" => FaultCode::Unsupported,
        _ => FaultCode::Rejected,
    }
}

/// W3C code for a legacy JSON Wire Protocol `status` number.
pub(crate) fn legacy_error(status: i64) -> &'static str {
    match status {
        6 => "invalid session id",
        7 => "no such element",
        9 => "unknown command",
        10 => "stale element reference",
        21 => "timeout",
        28 => "script timeout",
        32 => "invalid selector",
        33 => "session not created",
        _ => "unknown error",
    }
}
