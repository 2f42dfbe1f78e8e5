//! # UniBridge Core
//!
//! Sessions, element handles and command dispatch for the UniBridge
//! automation bridge.
//!
//! ## Components
//!
//! - [`Bridge`] - Opens sessions against registered backends
//! - [`Session`] - A caller-owned mobile or browser session
//! - [`Dispatcher`] - Routes unified commands to backend handlers
//! - [`ElementRegistry`] - Per-session element handle registry
//! - [`SimulatedBackend`] - In-memory backend for demos and tests

pub mod bridge;
pub mod dispatcher;
pub mod registry;
pub mod session;
pub mod simulated;

pub use bridge::{Bridge, BridgeBuilder, DEFAULT_COMMAND_TIMEOUT, DEFAULT_POLL_INTERVAL};
pub use dispatcher::{Dispatcher, HandlerTable};
pub use registry::{BackendRegistry, ElementRegistry, ProviderRegistry};
pub use session::{Action, Session, SessionLink};
pub use simulated::{SimElement, SimulatedBackend, SimulatedScreen};
