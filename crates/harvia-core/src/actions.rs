// ── Sauna actions ──
//
// The named operations a user invokes: list, status, power, temperature,
// lights, steamer, fan, humidity. Every action resolves an omitted device id
// to the first device on the account and reports failure as an
// `{"error": ...}` value instead of returning `Err`.

use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::controller::Controller;
use crate::convert::{fahrenheit_to_celsius, validate_humidity};
use crate::error::CoreError;
use crate::model::{DeviceListing, SaunaStatus, Switch};

/// Outcome of an action: the payload, or `{"error": message}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ActionResponse<T> {
    Ok(T),
    Error { error: String },
}

impl<T> ActionResponse<T> {
    /// Wrap a core result, prefixing failures with what was being attempted.
    fn from_result(result: Result<T, CoreError>, attempt: &str) -> Self {
        match result {
            Ok(value) => Self::Ok(value),
            Err(e) => Self::Error {
                error: format!("Failed to {attempt}: {e}"),
            },
        }
    }

    fn rejected(e: &CoreError) -> Self {
        Self::Error {
            error: e.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error { error } => Some(error),
            Self::Ok(_) => None,
        }
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Self::Ok(value) => Some(value),
            Self::Error { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    Ok,
}

/// What a state change set, echoed back in the [`Ack`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Change {
    Power {
        power: Switch,
    },
    Lights {
        lights: Switch,
    },
    Steamer {
        steamer: Switch,
    },
    Fan {
        fan: Switch,
    },
    Temperature {
        target_temperature_f: f64,
        target_temperature_c: i64,
    },
    Humidity {
        target_humidity_pct: i64,
    },
}

impl Change {
    /// The partial desired state sent to the backend.
    pub fn desired_state(&self) -> Map<String, Value> {
        let bit = |s: Switch| i64::from(s.is_on());
        let (key, value) = match *self {
            Self::Power { power } => ("active", json!(bit(power))),
            Self::Lights { lights } => ("light", json!(bit(lights))),
            Self::Steamer { steamer } => ("steamEn", json!(bit(steamer))),
            Self::Fan { fan } => ("fan", json!(bit(fan))),
            Self::Temperature {
                target_temperature_c,
                ..
            } => ("targetTemp", json!(target_temperature_c)),
            Self::Humidity {
                target_humidity_pct,
            } => ("targetRh", json!(target_humidity_pct)),
        };
        let mut desired = Map::new();
        desired.insert(key.to_owned(), value);
        desired
    }
}

/// Acknowledgement of an accepted state change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ack {
    pub status: AckStatus,
    pub device_id: String,
    #[serde(flatten)]
    pub change: Change,
}

// ── Actions ──────────────────────────────────────────────────────

/// The caller-facing command surface over a connected [`Controller`].
#[derive(Clone)]
pub struct Actions {
    controller: Controller,
}

impl Actions {
    pub fn new(controller: Controller) -> Self {
        Self { controller }
    }

    pub async fn list_devices(&self) -> ActionResponse<Vec<SaunaStatus>> {
        let result = self
            .controller
            .list_devices()
            .await
            .map(|devices| devices.iter().map(SaunaStatus::from).collect());
        ActionResponse::from_result(result, "list devices")
    }

    /// The full listing, with the devices the listing policy skipped.
    pub async fn device_listing(&self) -> ActionResponse<DeviceListing> {
        ActionResponse::from_result(self.controller.device_listing().await, "list devices")
    }

    pub async fn get_status(&self, device_id: Option<&str>) -> ActionResponse<SaunaStatus> {
        let result = async {
            let device_id = self.resolve_device(device_id).await?;
            let record = self.controller.get_device(&device_id).await?;
            Ok::<_, CoreError>(SaunaStatus::from(&record))
        }
        .await;
        ActionResponse::from_result(result, "get status")
    }

    pub async fn turn_on(&self, device_id: Option<&str>) -> ActionResponse<Ack> {
        self.apply(device_id, Change::Power { power: Switch::On }, "turn sauna on")
            .await
    }

    pub async fn turn_off(&self, device_id: Option<&str>) -> ActionResponse<Ack> {
        self.apply(device_id, Change::Power { power: Switch::Off }, "turn sauna off")
            .await
    }

    /// Set the target temperature, given in Fahrenheit (104-230).
    pub async fn set_temperature(
        &self,
        fahrenheit: f64,
        device_id: Option<&str>,
    ) -> ActionResponse<Ack> {
        let celsius = match fahrenheit_to_celsius(fahrenheit) {
            Ok(c) => c,
            Err(e) => return ActionResponse::rejected(&e),
        };
        let change = Change::Temperature {
            target_temperature_f: fahrenheit,
            target_temperature_c: celsius,
        };
        self.apply(device_id, change, "set temperature").await
    }

    pub async fn toggle_lights(&self, on: bool, device_id: Option<&str>) -> ActionResponse<Ack> {
        let change = Change::Lights { lights: on.into() };
        self.apply(device_id, change, "toggle lights").await
    }

    pub async fn toggle_steamer(&self, on: bool, device_id: Option<&str>) -> ActionResponse<Ack> {
        let change = Change::Steamer { steamer: on.into() };
        self.apply(device_id, change, "toggle steamer").await
    }

    pub async fn toggle_fan(&self, on: bool, device_id: Option<&str>) -> ActionResponse<Ack> {
        let change = Change::Fan { fan: on.into() };
        self.apply(device_id, change, "toggle fan").await
    }

    /// Set the target relative humidity (0-140 %).
    pub async fn set_humidity(&self, pct: i64, device_id: Option<&str>) -> ActionResponse<Ack> {
        let pct = match validate_humidity(pct) {
            Ok(pct) => pct,
            Err(e) => return ActionResponse::rejected(&e),
        };
        let change = Change::Humidity {
            target_humidity_pct: pct,
        };
        self.apply(device_id, change, "set humidity").await
    }

    async fn apply(
        &self,
        device_id: Option<&str>,
        change: Change,
        attempt: &str,
    ) -> ActionResponse<Ack> {
        let result = async {
            let device_id = self.resolve_device(device_id).await?;
            self.controller
                .send_state_change(&device_id, &change.desired_state())
                .await?;
            Ok::<_, CoreError>(Ack {
                status: AckStatus::Ok,
                device_id,
                change,
            })
        }
        .await;
        ActionResponse::from_result(result, attempt)
    }

    /// An explicit non-empty id, else the first device in tree order.
    async fn resolve_device(&self, device_id: Option<&str>) -> Result<String, CoreError> {
        if let Some(id) = device_id.filter(|id| !id.is_empty()) {
            return Ok(id.to_owned());
        }
        let first = self
            .controller
            .device_ids()
            .await?
            .into_iter()
            .next()
            .ok_or(CoreError::NoDevices)?;
        debug!(device_id = %first, "resolved default device");
        Ok(first)
    }
}
