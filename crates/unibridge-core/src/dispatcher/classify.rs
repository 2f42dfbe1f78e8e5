//! Reclassification of backend faults.

use std::time::Duration;

use unibridge_protocols::error::{BackendFault, BridgeError, FaultCode};

/// Map a raw backend fault onto the error taxonomy.
pub fn classify_fault(fault: BackendFault, elapsed: Duration) -> BridgeError {
    let message = format!("{}: {}", fault.method, fault.message);
    let error = match fault.code {
        FaultCode::Unreachable | FaultCode::Disconnected | FaultCode::InvalidSession => {
            BridgeError::transport(message)
        }
        FaultCode::NoSuchElement => BridgeError::element_not_found(message),
        FaultCode::StaleElement => BridgeError::stale_element(message),
        FaultCode::Timeout => BridgeError::timeout(message, elapsed),
        FaultCode::Rejected | FaultCode::Malformed | FaultCode::Unsupported => {
            BridgeError::protocol(message)
        }
    };
    error.with_cause(fault)
}
