//! # UniBridge Browser Backend
//!
//! Drives Chrome/Chromium through the DevTools Protocol. Every session gets
//! its own page target and WebSocket connection; element handles resolve to
//! DOM `backendNodeId`s, which stay valid until the node leaves the document.
//!
//! Start Chrome with remote debugging before opening sessions:
//!
//! ```bash
//! chrome --remote-debugging-port=9222
//! ```

pub mod cdp;

mod backend;
mod handlers;
mod selector;

pub use backend::{BrowserBackend, BrowserTransport};
pub use selector::{query_for, DomQuery};
