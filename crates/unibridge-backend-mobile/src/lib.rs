//! # UniBridge Mobile Backend
//!
//! Talks to an Appium (or any W3C WebDriver) server over HTTP. Commands are
//! named after the WebDriver endpoints they hit; see [`COMMANDS`].

mod backend;
mod client;
mod commands;
mod error;
mod handlers;

pub use backend::{MobileBackend, MobileTransport};
pub use client::WebDriverClient;
pub use commands::{lookup, Route, COMMANDS};
pub use error::fault_code;
