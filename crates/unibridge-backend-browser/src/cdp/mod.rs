//! Minimal Chrome DevTools Protocol client.
//!
//! Only what the bridge needs: endpoint discovery, request/response over the
//! browser WebSocket, and flat-mode session multiplexing. Events are read and
//! dropped.

mod client;
mod error;
mod protocol;

pub use client::{discover, CdpClient};
pub use error::CdpError;
pub use protocol::*;
