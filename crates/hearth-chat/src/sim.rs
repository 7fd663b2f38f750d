//! Simulated device backend
//!
//! Supplies the extra template fields a real home backend would derive
//! (display names, status reports, scene summaries). Pure-local: the
//! webhook dispatch is separate and authoritative for delivery.

use rand::Rng;
use serde_json::{Map, Value};

use hearth_core::HomeFunction;

/// Scene name -> what activating it does.
fn scene_details(scene: &str) -> &'static str {
    match scene {
        "movie_night" => "Living room lights dimmed, thermostat set to 72\u{b0}F.",
        "bedtime" => "All lights off, doors locked, thermostat set to 68\u{b0}F.",
        "morning" => "Kitchen and hallway lights on, thermostat set to 72\u{b0}F.",
        "away" => "All lights off, all doors locked, thermostat set to 65\u{b0}F.",
        "party" => "Living room and kitchen lights on, thermostat set to 70\u{b0}F.",
        _ => "",
    }
}

/// Wire room identifier -> readable display name. Unknown rooms pass
/// through unchanged.
fn room_display(room: &str) -> &str {
    match room {
        "living_room" => "living room",
        other => other,
    }
}

/// Template-extras provider standing in for the home backend.
#[derive(Debug, Clone, Default)]
pub struct DeviceSim;

impl DeviceSim {
    pub fn new() -> Self {
        Self
    }

    /// Extra template fields for a fully-specified call. Functions
    /// without extras contribute nothing.
    pub fn extras(&self, function: &HomeFunction, arguments: &Map<String, Value>) -> Map<String, Value> {
        let mut extras = Map::new();
        match function {
            HomeFunction::ToggleLights => {
                let room = str_arg(arguments, "room").unwrap_or("");
                extras.insert("display_room".into(), Value::String(room_display(room).to_string()));
            }
            HomeFunction::SetThermostat => {
                let suffix = arguments
                    .get("mode")
                    .and_then(mode_display)
                    .map(|mode| format!(" in {} mode", mode))
                    .unwrap_or_default();
                extras.insert("mode_suffix".into(), Value::String(suffix));
            }
            HomeFunction::GetDeviceStatus => {
                extras.insert(
                    "status_report".into(),
                    Value::String(self.simulate_status(arguments)),
                );
            }
            HomeFunction::SetScene => {
                let scene = str_arg(arguments, "scene").unwrap_or("");
                extras.insert(
                    "scene_details".into(),
                    Value::String(scene_details(scene).to_string()),
                );
            }
            _ => {}
        }
        extras
    }

    fn simulate_status(&self, arguments: &Map<String, Value>) -> String {
        let device_type = str_arg(arguments, "device_type").unwrap_or("all");
        let room = str_arg(arguments, "room").unwrap_or("");
        let mut rng = rand::thread_rng();

        match device_type {
            "lights" => {
                let state = if rng.gen_bool(0.5) { "on" } else { "off" };
                let display = if room.is_empty() { "the" } else { room_display(room) };
                format!("The {} lights are currently {}.", display, state)
            }
            "thermostat" => {
                let temp: i32 = rng.gen_range(65..=75);
                let mode = ["heat", "cool", "auto"][rng.gen_range(0..3)];
                format!("The thermostat is set to {}\u{b0}F in {} mode.", temp, mode)
            }
            "door" => {
                let door = if room.is_empty() { "front" } else { room };
                let state = if rng.gen_bool(0.5) { "locked" } else { "unlocked" };
                format!("The {} door is currently {}.", door, state)
            }
            _ => {
                let temp: i32 = rng.gen_range(65..=75);
                format!(
                    "Lights: mixed (some on, some off). Thermostat: {}\u{b0}F. \
                     Doors: front locked, back locked, garage unlocked.",
                    temp
                )
            }
        }
    }
}

/// Display form of a mode value. Empty-ish values (null, false, 0, "")
/// contribute no suffix; anything else renders, even when the model sends
/// a non-string.
fn mode_display(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

fn str_arg<'a>(arguments: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    arguments.get(name).and_then(Value::as_str)
}
