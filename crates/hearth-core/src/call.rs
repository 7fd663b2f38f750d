//! Structured function calls as decided by the model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A structured decision by the model: one function name plus an argument
/// mapping. Unknown argument keys are carried along untouched; consumers
/// ignore what they do not recognize.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: Map<String, Value>,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// An argument counts as set when it is present and non-null.
    /// `0`, `""` and `false` are all valid present values.
    pub fn has_argument(&self, name: &str) -> bool {
        matches!(self.arguments.get(name), Some(v) if !v.is_null())
    }

    /// Arguments serialized to the JSON string form the wire format expects.
    pub fn arguments_json(&self) -> String {
        Value::Object(self.arguments.clone()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn zero_and_empty_string_count_as_present() {
        let call = FunctionCall::new(
            "set_thermostat",
            args(json!({"temperature": 0, "mode": "", "away": false, "room": null})),
        );
        assert!(call.has_argument("temperature"));
        assert!(call.has_argument("mode"));
        assert!(call.has_argument("away"));
        assert!(!call.has_argument("room"));
        assert!(!call.has_argument("never_mentioned"));
    }
}
