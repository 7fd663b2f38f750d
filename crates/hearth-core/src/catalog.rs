//! Function catalogue and schema registry
//!
//! The callable surface is a closed set of smart-home functions plus an
//! explicit `Unknown` fallback. All per-function metadata (required
//! arguments, elicitation prompts, response templates) lives in lookup
//! tables keyed by the enum, loaded once at startup and never mutated.
//! Unknown names degrade to "no requirements": they execute with whatever
//! arguments were supplied. That permissive default is deliberate.

use std::fmt;

use serde_json::{json, Map, Value};

use crate::error::{Error, Result};

/// The fixed set of callable smart-home functions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HomeFunction {
    ToggleLights,
    SetThermostat,
    LockDoor,
    GetDeviceStatus,
    SetScene,
    /// Sentinel the model calls when the request maps to nothing above.
    IntentUnclear,
    /// Any name the model invents that is not in the catalogue.
    Unknown(String),
}

impl HomeFunction {
    /// Resolve a wire name. Never fails: unrecognized names become
    /// `Unknown` rather than an error.
    pub fn from_name(name: &str) -> Self {
        match name {
            "toggle_lights" => HomeFunction::ToggleLights,
            "set_thermostat" => HomeFunction::SetThermostat,
            "lock_door" => HomeFunction::LockDoor,
            "get_device_status" => HomeFunction::GetDeviceStatus,
            "set_scene" => HomeFunction::SetScene,
            "intent_unclear" => HomeFunction::IntentUnclear,
            other => HomeFunction::Unknown(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            HomeFunction::ToggleLights => "toggle_lights",
            HomeFunction::SetThermostat => "set_thermostat",
            HomeFunction::LockDoor => "lock_door",
            HomeFunction::GetDeviceStatus => "get_device_status",
            HomeFunction::SetScene => "set_scene",
            HomeFunction::IntentUnclear => "intent_unclear",
            HomeFunction::Unknown(name) => name,
        }
    }
}

impl fmt::Display for HomeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Per-function schema: argument sets, elicitation prompts and the
/// response template. Immutable after registry construction.
#[derive(Debug, Clone)]
pub struct FunctionSchema {
    pub function: HomeFunction,
    /// Required arguments, in elicitation order.
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
    /// Human-readable elicitation phrase per argument.
    pub prompts: &'static [(&'static str, &'static str)],
    pub template: &'static str,
    /// Placeholder names the backend contributes beyond the call's own
    /// arguments (display names, status summaries).
    pub extras: &'static [&'static str],
}

const SCHEMAS: &[FunctionSchema] = &[
    FunctionSchema {
        function: HomeFunction::ToggleLights,
        required: &["room", "state"],
        optional: &[],
        prompts: &[
            (
                "room",
                "which room (living room, bedroom, kitchen, bathroom, office, or hallway)",
            ),
            ("state", "whether to turn them on or off"),
        ],
        template: "Done. The {display_room} lights are now {state}.",
        extras: &["display_room"],
    },
    FunctionSchema {
        function: HomeFunction::SetThermostat,
        required: &["temperature"],
        optional: &["mode"],
        prompts: &[
            ("temperature", "what temperature (60-80\u{b0}F)"),
            ("mode", "the mode (heat, cool, or auto)"),
        ],
        template: "Done. Thermostat set to {temperature}\u{b0}F{mode_suffix}.",
        extras: &["mode_suffix"],
    },
    FunctionSchema {
        function: HomeFunction::LockDoor,
        required: &["door", "state"],
        optional: &[],
        prompts: &[
            ("door", "which door (front, back, garage, or side)"),
            ("state", "whether to lock or unlock it"),
        ],
        template: "Done. The {door} door is now {state}ed.",
        extras: &[],
    },
    FunctionSchema {
        function: HomeFunction::GetDeviceStatus,
        required: &["device_type"],
        optional: &["room"],
        prompts: &[
            (
                "device_type",
                "which device type (lights, thermostat, door, or all)",
            ),
            ("room", "which room or location"),
        ],
        template: "{status_report}",
        extras: &["status_report"],
    },
    FunctionSchema {
        function: HomeFunction::SetScene,
        required: &["scene"],
        optional: &[],
        prompts: &[(
            "scene",
            "which scene (movie night, bedtime, morning, away, or party)",
        )],
        template: "Done. \"{scene}\" scene activated. {scene_details}",
        extras: &["scene_details"],
    },
    FunctionSchema {
        function: HomeFunction::IntentUnclear,
        required: &[],
        optional: &["reason"],
        prompts: &[],
        template: "",
        extras: &[],
    },
];

/// Template used for functions outside the catalogue.
const UNKNOWN_TEMPLATE: &str = "Done.";

/// Read-only lookup over the function catalogue.
///
/// Construction validates every response template against its schema so
/// template/schema drift surfaces at startup, not per call.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: &'static [FunctionSchema],
}

impl SchemaRegistry {
    pub fn new() -> Result<Self> {
        validate_templates(SCHEMAS)?;
        Ok(Self { schemas: SCHEMAS })
    }

    pub fn schema(&self, function: &HomeFunction) -> Option<&FunctionSchema> {
        self.schemas.iter().find(|s| &s.function == function)
    }

    /// Required arguments for a function; unknown names have none, so
    /// they always execute with whatever arguments were given.
    pub fn required_args(&self, function: &HomeFunction) -> &'static [&'static str] {
        self.schema(function).map(|s| s.required).unwrap_or(&[])
    }

    /// Elicitation phrase for one argument. Falls back to the argument
    /// name with underscores replaced by spaces.
    pub fn slot_prompt(&self, function: &HomeFunction, arg: &str) -> String {
        self.schema(function)
            .and_then(|s| {
                s.prompts
                    .iter()
                    .find(|(name, _)| *name == arg)
                    .map(|(_, phrase)| (*phrase).to_string())
            })
            .unwrap_or_else(|| format!("the {}", arg.replace('_', " ")))
    }

    pub fn template(&self, function: &HomeFunction) -> &'static str {
        self.schema(function)
            .map(|s| s.template)
            .unwrap_or(UNKNOWN_TEMPLATE)
    }

    /// Render the function's template from the merged argument/extras
    /// mapping. Placeholders were validated at construction; an optional
    /// argument absent from the mapping renders as the empty string.
    pub fn render(&self, function: &HomeFunction, values: &Map<String, Value>) -> String {
        substitute(self.template(function), values)
    }
}

/// The tool catalogue in OpenAI function-calling format, sent verbatim to
/// the completion endpoint on every turn.
pub fn tool_catalog() -> Value {
    json!([
        {
            "type": "function",
            "function": {
                "name": "toggle_lights",
                "description": "Turn lights on or off in a specified room.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "room": {
                            "type": "string",
                            "enum": ["living_room", "bedroom", "kitchen", "bathroom", "office", "hallway"],
                            "description": "The room whose lights to control."
                        },
                        "state": {
                            "type": "string",
                            "enum": ["on", "off"],
                            "description": "Whether to turn lights on or off."
                        }
                    },
                    "required": [],
                    "additionalProperties": false
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "set_thermostat",
                "description": "Set the temperature for heating or cooling.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "temperature": {
                            "type": "integer",
                            "minimum": 60,
                            "maximum": 80,
                            "description": "The target temperature in degrees Fahrenheit (60-80)."
                        },
                        "mode": {
                            "type": "string",
                            "enum": ["heat", "cool", "auto"],
                            "description": "The thermostat mode: heat, cool, or auto."
                        }
                    },
                    "required": [],
                    "additionalProperties": false
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "lock_door",
                "description": "Lock or unlock a door.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "door": {
                            "type": "string",
                            "enum": ["front", "back", "garage", "side"],
                            "description": "Which door to lock or unlock."
                        },
                        "state": {
                            "type": "string",
                            "enum": ["lock", "unlock"],
                            "description": "Whether to lock or unlock the door."
                        }
                    },
                    "required": [],
                    "additionalProperties": false
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "get_device_status",
                "description": "Query the current state of a device or room.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "device_type": {
                            "type": "string",
                            "enum": ["lights", "thermostat", "door", "all"],
                            "description": "The type of device to check."
                        },
                        "room": {
                            "type": "string",
                            "description": "The room or location to check."
                        }
                    },
                    "required": [],
                    "additionalProperties": false
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "set_scene",
                "description": "Activate a predefined scene that controls multiple devices at once.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "scene": {
                            "type": "string",
                            "enum": ["movie_night", "bedtime", "morning", "away", "party"],
                            "description": "The scene to activate."
                        }
                    },
                    "required": [],
                    "additionalProperties": false
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "intent_unclear",
                "description": "Call when the user's request is ambiguous, off-topic, or cannot be mapped to any available smart home function.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "reason": {
                            "type": "string",
                            "enum": ["ambiguous", "off_topic", "incomplete", "unsupported_device"],
                            "description": "Why the intent is unclear."
                        }
                    },
                    "required": [],
                    "additionalProperties": false
                }
            }
        }
    ])
}

/// Every template placeholder must name a declared argument or extra.
fn validate_templates(schemas: &[FunctionSchema]) -> Result<()> {
    for schema in schemas {
        for placeholder in placeholders(schema.template) {
            let declared = schema.required.contains(&placeholder)
                || schema.optional.contains(&placeholder)
                || schema.extras.contains(&placeholder);
            if !declared {
                return Err(Error::template(format!(
                    "template for '{}' references undeclared placeholder '{}'",
                    schema.function, placeholder
                )));
            }
        }
    }
    Ok(())
}

/// Extract `{placeholder}` names from a template.
fn placeholders(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        rest = &rest[start + 1..];
        if let Some(end) = rest.find('}') {
            names.push(&rest[..end]);
            rest = &rest[end + 1..];
        } else {
            break;
        }
    }
    names
}

fn substitute(template: &str, values: &Map<String, Value>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        if let Some(end) = after.find('}') {
            if let Some(value) = values.get(&after[..end]) {
                out.push_str(&value_display(value));
            }
            rest = &after[end + 1..];
        } else {
            out.push_str(&rest[start..]);
            rest = "";
        }
    }
    out.push_str(rest);
    out
}

/// Render a JSON value the way it should read in a sentence: strings
/// unquoted, numbers bare, null empty.
fn value_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registry_validates_at_startup() {
        assert!(SchemaRegistry::new().is_ok());
    }

    #[test]
    fn undeclared_placeholder_is_a_hard_template_error() {
        // scene_details is rendered by the backend but not declared here.
        const DRIFTED: &[FunctionSchema] = &[FunctionSchema {
            function: HomeFunction::SetScene,
            required: &["scene"],
            optional: &[],
            prompts: &[],
            template: "Done. \"{scene}\" scene activated. {scene_details}",
            extras: &[],
        }];

        let err = validate_templates(DRIFTED).unwrap_err();
        assert!(matches!(err, Error::Template(_)));
        assert!(err.to_string().contains("scene_details"));
        assert!(err.to_string().contains("set_scene"));
    }

    #[test]
    fn required_args_in_declared_order() {
        let registry = SchemaRegistry::new().unwrap();
        assert_eq!(
            registry.required_args(&HomeFunction::ToggleLights),
            &["room", "state"]
        );
        assert_eq!(
            registry.required_args(&HomeFunction::SetThermostat),
            &["temperature"]
        );
        assert!(registry
            .required_args(&HomeFunction::IntentUnclear)
            .is_empty());
    }

    #[test]
    fn unknown_function_has_no_requirements() {
        let registry = SchemaRegistry::new().unwrap();
        let unknown = HomeFunction::from_name("launch_rocket");
        assert_eq!(unknown, HomeFunction::Unknown("launch_rocket".into()));
        assert!(registry.required_args(&unknown).is_empty());
        assert_eq!(registry.template(&unknown), "Done.");
    }

    #[test]
    fn slot_prompt_falls_back_to_spaced_name() {
        let registry = SchemaRegistry::new().unwrap();
        assert_eq!(
            registry.slot_prompt(&HomeFunction::LockDoor, "state"),
            "whether to lock or unlock it"
        );
        assert_eq!(
            registry.slot_prompt(&HomeFunction::LockDoor, "secret_code"),
            "the secret code"
        );
    }

    #[test]
    fn render_substitutes_arguments_and_extras() {
        let registry = SchemaRegistry::new().unwrap();
        let mut values = Map::new();
        values.insert("display_room".into(), json!("living room"));
        values.insert("state".into(), json!("on"));
        assert_eq!(
            registry.render(&HomeFunction::ToggleLights, &values),
            "Done. The living room lights are now on."
        );
    }

    #[test]
    fn render_numbers_bare_and_absent_optionals_empty() {
        let registry = SchemaRegistry::new().unwrap();
        let mut values = Map::new();
        values.insert("temperature".into(), json!(70));
        values.insert("mode_suffix".into(), json!(""));
        assert_eq!(
            registry.render(&HomeFunction::SetThermostat, &values),
            "Done. Thermostat set to 70\u{b0}F."
        );
    }

    #[test]
    fn tool_catalog_matches_function_names() {
        let catalog = tool_catalog();
        let names: Vec<&str> = catalog
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["function"]["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec![
                "toggle_lights",
                "set_thermostat",
                "lock_door",
                "get_device_status",
                "set_scene",
                "intent_unclear"
            ]
        );
    }

    #[test]
    fn placeholder_extraction() {
        assert_eq!(
            placeholders("Done. The {door} door is now {state}ed."),
            vec!["door", "state"]
        );
        assert!(placeholders("Done.").is_empty());
    }
}
