//! Action delivery for the hearth dialogue core
//!
//! One logical dispatch = one correlation id, at most three delivery
//! attempts, and always a result value the orchestrator can render.

pub mod dispatcher;

pub use dispatcher::{
    ActionDispatcher, ActionExecutionResult, ActionSink, DEFAULT_WEBHOOK_URL,
};
