//! Completion client for the hearth dialogue core
//!
//! Wraps an OpenAI-compatible chat-completions endpoint behind the
//! [`CompletionBackend`] seam. The client forces tool choice, pins
//! temperature to 0 and measures wall-clock latency per call.

pub mod backend;
pub mod slm;

pub use backend::{Completion, CompletionBackend, CompletionOutcome};
pub use slm::{parse_outcome, SlmClient, SlmConfig};
