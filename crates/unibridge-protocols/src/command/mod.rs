//! Unified commands and their results.

mod operation;
mod request;
mod result;
mod step;

pub use operation::*;
pub use request::*;
pub use result::*;
pub use step::*;
