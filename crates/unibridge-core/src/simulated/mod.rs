//! In-memory backend for demos and tests.
//!
//! The simulated backend is an explicit alternative to a real engine: it is
//! registered like any other backend and never substitutes itself for one.

mod backend;
mod screen;

pub use backend::{SimulatedBackend, SimulatedTransport};
pub use screen::{SimElement, SimulatedScreen};
