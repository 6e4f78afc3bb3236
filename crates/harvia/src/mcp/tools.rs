//! The sauna tools: their schemas and their mapping onto [`Actions`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use harvia_core::{ActionResponse, Actions};

use super::protocol::{Tool, ToolCallResult};

const DEVICE_ID_DESCRIPTION: &str = "Sauna device id; defaults to the first device on the account";

fn device_only() -> Value {
    json!({
        "type": "object",
        "properties": {
            "device_id": { "type": "string", "description": DEVICE_ID_DESCRIPTION }
        }
    })
}

fn switch(what: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "on": {
                "type": "boolean",
                "description": format!("true to turn the {what} on, false to turn it off")
            },
            "device_id": { "type": "string", "description": DEVICE_ID_DESCRIPTION }
        },
        "required": ["on"]
    })
}

/// Every tool this server offers, in listing order.
pub fn catalogue() -> Vec<Tool> {
    vec![
        Tool {
            name: "list_devices",
            description: "List all saunas on the account with their current status.",
            input_schema: json!({ "type": "object", "properties": {} }),
        },
        Tool {
            name: "get_sauna_status",
            description: "Get the current status of a sauna: power, temperatures, humidity, \
                          lights, fan, steamer and door.",
            input_schema: device_only(),
        },
        Tool {
            name: "turn_sauna_on",
            description: "Turn the sauna heater on.",
            input_schema: device_only(),
        },
        Tool {
            name: "turn_sauna_off",
            description: "Turn the sauna heater off.",
            input_schema: device_only(),
        },
        Tool {
            name: "set_temperature",
            description: "Set the target temperature in degrees Fahrenheit (104-230).",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "temperature": {
                        "type": "number",
                        "minimum": 104,
                        "maximum": 230,
                        "description": "Target temperature in °F"
                    },
                    "device_id": { "type": "string", "description": DEVICE_ID_DESCRIPTION }
                },
                "required": ["temperature"]
            }),
        },
        Tool {
            name: "toggle_lights",
            description: "Turn the sauna lights on or off.",
            input_schema: switch("lights"),
        },
        Tool {
            name: "toggle_steamer",
            description: "Turn the steamer on or off.",
            input_schema: switch("steamer"),
        },
        Tool {
            name: "toggle_fan",
            description: "Turn the fan on or off.",
            input_schema: switch("fan"),
        },
        Tool {
            name: "set_humidity",
            description: "Set the target relative humidity in percent (0-140).",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "humidity": {
                        "type": "integer",
                        "minimum": 0,
                        "maximum": 140,
                        "description": "Target relative humidity in %"
                    },
                    "device_id": { "type": "string", "description": DEVICE_ID_DESCRIPTION }
                },
                "required": ["humidity"]
            }),
        },
    ]
}

pub fn is_known(name: &str) -> bool {
    catalogue().iter().any(|tool| tool.name == name)
}

// ── Arguments ───────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct Target {
    #[serde(default)]
    device_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Temperature {
    temperature: f64,
    #[serde(default)]
    device_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Toggle {
    on: bool,
    #[serde(default)]
    device_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Humidity {
    humidity: i64,
    #[serde(default)]
    device_id: Option<String>,
}

fn parse<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, ToolCallResult> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| {
        ToolCallResult::json(
            &json!({ "error": format!("Invalid arguments for {tool}: {e}") }),
            true,
        )
    })
}

// ── Dispatch ────────────────────────────────────────────────────────

/// Runs the named tools against one [`Actions`] surface.
pub struct ToolHandlers {
    actions: Actions,
    default_device: Option<String>,
}

impl ToolHandlers {
    /// `default_device` stands in for an omitted `device_id`; without it the
    /// action picks the first device on the account.
    pub fn new(actions: Actions, default_device: Option<String>) -> Self {
        Self {
            actions,
            default_device,
        }
    }

    /// Call `name`; the caller has already checked it with [`is_known`].
    pub async fn call(&self, name: &str, arguments: Value) -> ToolCallResult {
        match self.dispatch(name, arguments).await {
            Ok(result) | Err(result) => result,
        }
    }

    async fn dispatch(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<ToolCallResult, ToolCallResult> {
        let a = &self.actions;
        let result = match name {
            // A failed listing reads as a one-element list holding the error.
            "list_devices" => match a.list_devices().await {
                ActionResponse::Error { error } => {
                    ToolCallResult::json(&json!([{ "error": error }]), true)
                }
                listing => render(listing),
            },
            "get_sauna_status" => {
                let args: Target = parse(name, arguments)?;
                render(a.get_status(self.device(args.device_id.as_deref())).await)
            }
            "turn_sauna_on" => {
                let args: Target = parse(name, arguments)?;
                render(a.turn_on(self.device(args.device_id.as_deref())).await)
            }
            "turn_sauna_off" => {
                let args: Target = parse(name, arguments)?;
                render(a.turn_off(self.device(args.device_id.as_deref())).await)
            }
            "set_temperature" => {
                let args: Temperature = parse(name, arguments)?;
                let device = self.device(args.device_id.as_deref());
                render(a.set_temperature(args.temperature, device).await)
            }
            "toggle_lights" => {
                let args: Toggle = parse(name, arguments)?;
                render(a.toggle_lights(args.on, self.device(args.device_id.as_deref())).await)
            }
            "toggle_steamer" => {
                let args: Toggle = parse(name, arguments)?;
                render(a.toggle_steamer(args.on, self.device(args.device_id.as_deref())).await)
            }
            "toggle_fan" => {
                let args: Toggle = parse(name, arguments)?;
                render(a.toggle_fan(args.on, self.device(args.device_id.as_deref())).await)
            }
            "set_humidity" => {
                let args: Humidity = parse(name, arguments)?;
                let device = self.device(args.device_id.as_deref());
                render(a.set_humidity(args.humidity, device).await)
            }
            other => {
                ToolCallResult::json(&json!({ "error": format!("Unknown tool: {other}") }), true)
            }
        };
        Ok(result)
    }

    fn device<'a>(&'a self, explicit: Option<&'a str>) -> Option<&'a str> {
        explicit
            .filter(|id| !id.is_empty())
            .or(self.default_device.as_deref())
    }
}

fn render<T: Serialize>(response: ActionResponse<T>) -> ToolCallResult {
    let is_error = response.is_error();
    match serde_json::to_value(&response) {
        Ok(value) => ToolCallResult::json(&value, is_error),
        Err(e) => {
            let error = format!("Failed to encode result: {e}");
            ToolCallResult::json(&json!({ "error": error }), true)
        }
    }
}
