//! # UniBridge Protocols
//!
//! Shared definitions for the UniBridge automation bridge.
//! Contains only data types and interface definitions - no implementations.
//!
//! ## Core Traits
//!
//! - [`Backend`] - An automation engine (mobile server, browser) sessions are opened against
//! - [`BackendTransport`] - A live, per-session connection to a backend
//! - [`CommandHandler`] - Executes one unified [`Operation`] against a transport
//! - [`ProviderAdapter`] - An AI/language-model provider

pub mod backend;
pub mod command;
pub mod error;
pub mod provider;
pub mod types;

pub use backend::{Backend, BackendTransport, CommandHandler, Connection, HandlerCall};
pub use command::{Command, CommandOutput, CommandResult, ElementRef, Operation, PlannedStep};
pub use error::{BackendFault, BridgeError, ErrorKind, FaultCode};
pub use provider::{ProviderAdapter, ProviderRequest, ProviderResponse, Usage};
pub use types::*;
