//! Backend protocol definitions.
//!
//! A backend (mobile automation server, browser engine) opens per-session
//! transports and supplies one handler per unified operation it supports.

mod traits;

pub use traits::*;
