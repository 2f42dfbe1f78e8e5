//! Core data model shared across the bridge.

mod capabilities;
mod element;
mod ids;
mod locator;
mod session;

pub use capabilities::*;
pub use element::*;
pub use ids::*;
pub use locator::*;
pub use session::*;
