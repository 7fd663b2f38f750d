//! Dialogue orchestrator
//!
//! Deterministic state machine between the user and the model. Per turn:
//! append the user utterance, invoke the completion backend with the full
//! history, then route the outcome: clarify (nothing parseable, or the
//! `intent_unclear` sentinel), elicit (required arguments missing), or
//! execute (dispatch the call and render the templated reply).
//!
//! One orchestrator instance owns one conversation; turns are strictly
//! sequential. The session ends on a case-insensitive "quit"/"exit"
//! sentinel, checked before the history is touched.

use serde_json::Map;
use tracing::{debug, warn};

use hearth_core::{ConversationTurn, FunctionCall, HomeFunction, Result, SchemaRegistry};
use hearth_dispatch::ActionSink;
use hearth_llm::{CompletionBackend, CompletionOutcome};

use crate::sim::DeviceSim;

/// Everything one turn produced: the reply to show, the model's decision
/// and the completion latency. Returned per call so the benchmark driver
/// never reads hidden orchestrator state.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub reply: String,
    pub decision: CompletionOutcome,
    pub latency_ms: f64,
}

/// Fixed clarification reply, listing the supported capability
/// categories.
pub const CLARIFICATION: &str = "I didn't quite understand that. Could you tell me what you need? \
I can help you control lights, set the thermostat, lock or unlock doors, \
check device status, or activate scenes.";

pub struct Orchestrator<B, S> {
    registry: SchemaRegistry,
    backend: B,
    sink: S,
    sim: DeviceSim,
    history: Vec<ConversationTurn>,
}

impl<B: CompletionBackend, S: ActionSink> Orchestrator<B, S> {
    /// Registry construction validates response templates, so drift
    /// between templates and schemas fails here, not mid-conversation.
    pub fn new(backend: B, sink: S) -> Result<Self> {
        Ok(Self {
            registry: SchemaRegistry::new()?,
            backend,
            sink,
            sim: DeviceSim::new(),
            history: Vec::new(),
        })
    }

    /// Full turn: user text in, bot reply out. `None` signals session
    /// end (exit sentinel). Completion transport faults propagate; every
    /// other failure mode resolves to a user-facing sentence.
    pub async fn process_utterance(&mut self, transcript: &str) -> Result<Option<TurnOutcome>> {
        if is_exit_sentinel(transcript) {
            return Ok(None);
        }

        self.history.push(ConversationTurn::user(transcript));

        let completion = self.backend.invoke(&self.history).await?;
        debug!(latency_ms = completion.latency_ms, "model decided: {:?}", completion.outcome);

        let reply = match &completion.outcome {
            CompletionOutcome::Unparsed(_) => {
                // Keep the transcript well-formed for the next turn.
                self.history.push(ConversationTurn::assistant(""));
                CLARIFICATION.to_string()
            }
            CompletionOutcome::Call(call) => {
                let call = call.clone();
                self.history.push(ConversationTurn::tool_call(call.clone()));
                let reply = self.handle_call(&call).await;
                self.history.push(ConversationTurn::assistant(reply.clone()));
                reply
            }
        };

        Ok(Some(TurnOutcome {
            reply,
            decision: completion.outcome,
            latency_ms: completion.latency_ms,
        }))
    }

    /// Drop the whole conversation; the next turn starts a new session.
    pub fn reset(&mut self) {
        self.history.clear();
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    async fn handle_call(&self, call: &FunctionCall) -> String {
        let function = HomeFunction::from_name(&call.name);

        // The sentinel's reason code is informational only.
        if function == HomeFunction::IntentUnclear {
            return CLARIFICATION.to_string();
        }

        let missing = self.missing_args(&function, call);
        if !missing.is_empty() {
            return self.elicitation_question(&function, &missing);
        }

        self.execute_and_respond(&function, call).await
    }

    /// Required-but-absent arguments, in schema-declared order. Unknown
    /// functions have no requirements and always fall straight through
    /// to execution.
    fn missing_args(&self, function: &HomeFunction, call: &FunctionCall) -> Vec<&'static str> {
        self.registry
            .required_args(function)
            .iter()
            .copied()
            .filter(|arg| !call.has_argument(arg))
            .collect()
    }

    fn elicitation_question(&self, function: &HomeFunction, missing: &[&str]) -> String {
        let questions: Vec<String> = missing
            .iter()
            .map(|arg| self.registry.slot_prompt(function, arg))
            .collect();

        match questions.as_slice() {
            [single] => format!("Could you provide {}?", single),
            [head @ .., last] => {
                format!("Could you provide {}, and {}?", head.join(", "), last)
            }
            [] => unreachable!("elicitation requires at least one missing argument"),
        }
    }

    async fn execute_and_respond(&self, function: &HomeFunction, call: &FunctionCall) -> String {
        let result = self.sink.dispatch(&call.name, &call.arguments).await;

        let mut values: Map<_, _> = call.arguments.clone();
        values.extend(self.sim.extras(function, &call.arguments));

        let mut reply = self.registry.render(function, &values);
        if !result.ok {
            warn!(
                request_id = %result.request_id,
                message = %result.message,
                "action delivery unconfirmed"
            );
            reply.push_str(&format!(
                " (Note: the home controller did not confirm this action: {}.)",
                result.message
            ));
        }
        reply
    }
}

fn is_exit_sentinel(transcript: &str) -> bool {
    transcript.eq_ignore_ascii_case("quit") || transcript.eq_ignore_ascii_case("exit")
}
