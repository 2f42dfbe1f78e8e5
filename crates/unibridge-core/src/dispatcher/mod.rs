//! Command dispatch.
//!
//! The dispatcher is a lookup table from (backend kind, operation) to a
//! handler supplied by the backend, plus the single boundary that turns
//! handler faults, panics and timeouts into [`BridgeError`]s.
//!
//! [`BridgeError`]: unibridge_protocols::error::BridgeError

mod classify;
mod dispatch;
mod table;

pub use classify::classify_fault;
pub use dispatch::Dispatcher;
pub use table::HandlerTable;
