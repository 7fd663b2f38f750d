//! Completion backend seam
//!
//! The orchestrator talks to the model through this trait so tests and
//! the benchmark can run against scripted in-memory backends.

use async_trait::async_trait;

use hearth_core::{ConversationTurn, FunctionCall, Result};

/// What the model decided this turn. Every completion resolves to one of
/// these two values; parse ambiguity is never an error.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// A structured tool call was recovered from the response.
    Call(FunctionCall),
    /// Nothing parseable as a call; carries the raw response for
    /// diagnostics.
    Unparsed(String),
}

impl CompletionOutcome {
    pub fn as_call(&self) -> Option<&FunctionCall> {
        match self {
            CompletionOutcome::Call(call) => Some(call),
            CompletionOutcome::Unparsed(_) => None,
        }
    }
}

/// One completion round-trip: the outcome plus the wall-clock latency of
/// the network call, present regardless of success.
#[derive(Debug, Clone)]
pub struct Completion {
    pub outcome: CompletionOutcome,
    pub latency_ms: f64,
}

/// Chat-completion-capable endpoint. Transport faults are the only hard
/// errors; everything else is a [`CompletionOutcome`] value.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn invoke(&self, history: &[ConversationTurn]) -> Result<Completion>;
}
