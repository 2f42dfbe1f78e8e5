//! AI provider protocol definitions.
//!
//! Providers connect to language-model APIs (OpenAI, Gemini, ...) behind one
//! normalized request/response shape.

mod request;
mod response;
mod traits;

pub use request::*;
pub use response::*;
pub use traits::*;
