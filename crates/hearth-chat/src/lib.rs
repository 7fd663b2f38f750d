//! Dialogue orchestration for hearth
//!
//! Owns the conversation, validates model tool calls against the schema
//! registry, elicits missing required arguments instead of guessing, and
//! dispatches fully-specified calls through the action sink.

pub mod orchestrator;
pub mod sim;

pub use orchestrator::{Orchestrator, TurnOutcome, CLARIFICATION};
pub use sim::DeviceSim;
