//! Conversation history turns and their wire serialization
//!
//! The history is a closed sum of turn kinds owned by one orchestrator.
//! Format concerns live in one place: `to_wire` produces exactly the
//! OpenAI chat-completions message shape, including tool-call turns with
//! their arguments re-encoded as a JSON string.

use serde_json::{json, Value};

use crate::call::FunctionCall;

/// One turn of the conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationTurn {
    /// What the user said.
    User { text: String },
    /// A fully-decided tool call recorded as assistant context.
    ToolCall { call: FunctionCall },
    /// Plain assistant text (templated replies, or an empty placeholder
    /// after an unparsable model response).
    Assistant { text: String },
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        ConversationTurn::User { text: text.into() }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        ConversationTurn::Assistant { text: text.into() }
    }

    pub fn tool_call(call: FunctionCall) -> Self {
        ConversationTurn::ToolCall { call }
    }

    /// Serialize this turn to the chat-completions message shape.
    pub fn to_wire(&self) -> Value {
        match self {
            ConversationTurn::User { text } => json!({
                "role": "user",
                "content": text,
            }),
            ConversationTurn::Assistant { text } => json!({
                "role": "assistant",
                "content": text,
            }),
            ConversationTurn::ToolCall { call } => json!({
                "role": "assistant",
                "tool_calls": [{
                    "type": "function",
                    "function": {
                        "name": call.name,
                        "arguments": call.arguments_json(),
                    }
                }],
            }),
        }
    }
}

/// Serialize a whole history in order.
pub fn history_to_wire(history: &[ConversationTurn]) -> Vec<Value> {
    history.iter().map(ConversationTurn::to_wire).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_and_assistant_wire_shape() {
        let user = ConversationTurn::user("Turn on the lights");
        assert_eq!(
            user.to_wire(),
            json!({"role": "user", "content": "Turn on the lights"})
        );

        let placeholder = ConversationTurn::assistant("");
        assert_eq!(
            placeholder.to_wire(),
            json!({"role": "assistant", "content": ""})
        );
    }

    #[test]
    fn tool_call_arguments_are_string_encoded() {
        let mut args = serde_json::Map::new();
        args.insert("room".into(), json!("kitchen"));
        let turn = ConversationTurn::tool_call(FunctionCall::new("toggle_lights", args));

        let wire = turn.to_wire();
        assert_eq!(wire["role"], "assistant");
        let function = &wire["tool_calls"][0]["function"];
        assert_eq!(function["name"], "toggle_lights");

        // Arguments travel as a JSON-encoded string, not a nested object.
        let encoded = function["arguments"].as_str().unwrap();
        let decoded: Value = serde_json::from_str(encoded).unwrap();
        assert_eq!(decoded, json!({"room": "kitchen"}));
    }

    #[test]
    fn history_order_is_preserved() {
        let history = vec![
            ConversationTurn::user("hi"),
            ConversationTurn::assistant("hello"),
            ConversationTurn::user("lights on"),
        ];
        let wire = history_to_wire(&history);
        assert_eq!(wire.len(), 3);
        assert_eq!(wire[0]["role"], "user");
        assert_eq!(wire[1]["role"], "assistant");
        assert_eq!(wire[2]["content"], "lights on");
    }
}
