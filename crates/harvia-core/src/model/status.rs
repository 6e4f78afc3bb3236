// ── Status projection ──
//
// The human-facing view of a `DeviceRecord`: on/off switches, temperatures
// in both units, and the door state decoded from the status digits.
// Celsius and percent readings are passed through exactly as reported.

use serde::Serialize;
use serde_json::Number;

use super::device::DeviceRecord;
use crate::convert::celsius_to_fahrenheit;

/// An on/off switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Switch {
    On,
    Off,
}

impl From<bool> for Switch {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

impl Switch {
    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DoorState {
    Open,
    Closed,
}

impl DoorState {
    /// Decode the second status digit: `9` is open, any other digit closed.
    ///
    /// `None` when there is no second character or it is not a digit.
    pub fn from_status_codes(codes: &str) -> Option<Self> {
        let digit = codes.chars().nth(1)?.to_digit(10)?;
        Some(if digit == 9 { Self::Open } else { Self::Closed })
    }
}

/// Human-readable status of one sauna.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaunaStatus {
    pub device_id: String,
    pub name: Option<String>,
    pub power: Switch,
    pub lights: Switch,
    pub fan: Switch,
    pub steamer: Switch,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_temperature_f: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_temperature_c: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_temperature_f: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_temperature_c: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity_pct: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_humidity_pct: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_time_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub door: Option<DoorState>,
}

impl From<&DeviceRecord> for SaunaStatus {
    fn from(d: &DeviceRecord) -> Self {
        let on = |flag: Option<bool>| flag.unwrap_or(false);
        Self {
            device_id: d.device_id.clone(),
            name: d.display_name.clone(),
            power: Switch::from(on(d.active) || on(d.heat_on)),
            lights: Switch::from(on(d.light)),
            fan: Switch::from(on(d.fan)),
            steamer: Switch::from(on(d.steam_en) || on(d.steam_on)),
            target_temperature_f: fahrenheit(d.target_temp.as_ref()),
            target_temperature_c: d.target_temp.clone(),
            current_temperature_f: fahrenheit(d.temperature.as_ref()),
            current_temperature_c: d.temperature.clone(),
            humidity_pct: d.humidity.clone(),
            target_humidity_pct: d.target_rh.clone(),
            remaining_time_min: d.remaining_time,
            door: d.status_codes.as_deref().and_then(DoorState::from_status_codes),
        }
    }
}

fn fahrenheit(celsius: Option<&Number>) -> Option<f64> {
    celsius.and_then(Number::as_f64).map(celsius_to_fahrenheit)
}
