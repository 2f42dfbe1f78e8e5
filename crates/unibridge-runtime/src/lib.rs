//! # UniBridge Runtime
//!
//! Provider-facing runtime: the retry governor that wraps every provider
//! call, and the AI facade exposing task-level operations on top of it.

pub mod facade;
pub mod retry;

pub use facade::{
    AiFacade, AppStructure, FacadeSettings, FlowSummary, GeneratedScript, ScreenContext,
    ScreenSummary, ScriptLanguage,
};
pub use retry::{is_retryable, RetryClassifier, RetryGovernor, RetryPolicy, RetryProvider};
