//! Error types shared by every UniBridge component.

mod bridge;
mod fault;
mod status;

pub use bridge::*;
pub use fault::*;
pub use status::*;
