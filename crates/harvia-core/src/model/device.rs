// ── Device record ──
//
// A flat projection of one sauna: its reported state overlaid with the
// latest telemetry sample, keyed by the tree-derived device id. Known keys
// are typed and optional; everything else is kept in `extra`, including a
// known key whose value cannot be read as its type.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use super::lenient::{self, Shape};
use crate::error::CoreError;

/// Wire keys of the typed fields, with the shape each one decodes.
const TYPED_KEYS: &[(&str, Shape)] = &[
    ("displayName", Shape::Text),
    ("active", Shape::Flag),
    ("heatOn", Shape::Flag),
    ("light", Shape::Flag),
    ("fan", Shape::Flag),
    ("steamEn", Shape::Flag),
    ("steamOn", Shape::Flag),
    ("targetTemp", Shape::Number),
    ("temperature", Shape::Number),
    ("humidity", Shape::Number),
    ("targetRh", Shape::Number),
    ("remainingTime", Shape::Integer),
    ("statusCodes", Shape::Text),
    ("timestamp", Shape::Integer),
    ("type", Shape::Text),
];

/// Merged reported state and telemetry for one device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    #[serde(default)]
    pub device_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::text")]
    pub display_name: Option<String>,

    // ── Switches ──
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::flag")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::flag")]
    pub heat_on: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::flag")]
    pub light: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::flag")]
    pub fan: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::flag")]
    pub steam_en: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::flag")]
    pub steam_on: Option<bool>,

    // ── Climate (Celsius, percent) ──
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::number")]
    pub target_temp: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::number")]
    pub temperature: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::number")]
    pub humidity: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::number")]
    pub target_rh: Option<Number>,

    // ── Session ──
    /// Minutes left in the current heating session.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::integer")]
    pub remaining_time: Option<i64>,
    /// Composite status digits; the second one encodes the door.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::text")]
    pub status_codes: Option<String>,

    // ── Telemetry envelope ──
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::integer")]
    pub timestamp: Option<i64>,
    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::text"
    )]
    pub sample_type: Option<String>,

    /// Keys this model does not know about, preserved as sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeviceRecord {
    /// Overlay `telemetry` on `reported` and stamp the device id.
    ///
    /// Telemetry wins on key collisions. `deviceId` is always `device_id`,
    /// whatever either payload says. A known key whose value does not read
    /// as its type lands in `extra` untouched and its typed field stays `None`.
    pub fn merge(
        device_id: &str,
        reported: Map<String, Value>,
        telemetry: Map<String, Value>,
    ) -> Result<Self, CoreError> {
        let mut merged = reported;
        merged.extend(telemetry);
        merged.insert("deviceId".into(), Value::String(device_id.to_owned()));

        let mut unreadable = Map::new();
        for &(key, shape) in TYPED_KEYS {
            if merged.get(key).is_some_and(|value| !shape.accepts(value)) {
                if let Some(value) = merged.remove(key) {
                    unreadable.insert(key.to_owned(), value);
                }
            }
        }

        let mut record: Self = serde_json::from_value(Value::Object(merged)).map_err(|e| {
            CoreError::malformed(format!("cannot decode state of device {device_id}: {e}"))
        })?;
        record.extra.extend(unreadable);
        Ok(record)
    }

    /// An unmodelled key.
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

/// A device left out of a listing, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedDevice {
    pub device_id: String,
    pub error: String,
}

/// Result of a device listing.
///
/// `skipped` is only ever non-empty under `ListingPolicy::SkipFailed`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceListing {
    pub devices: Vec<DeviceRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedDevice>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn telemetry_wins_on_collision() {
        let record = DeviceRecord::merge(
            "dev-1",
            object(json!({ "power": 1 })),
            object(json!({ "power": 0, "timestamp": 1000, "type": "sample" })),
        )
        .expect("merge");

        assert_eq!(record.extra("power"), Some(&json!(0)));
        assert_eq!(record.timestamp, Some(1000));
        assert_eq!(record.sample_type.as_deref(), Some("sample"));
    }

    #[test]
    fn device_id_comes_from_the_tree() {
        let record = DeviceRecord::merge(
            "tree-id",
            object(json!({ "deviceId": "reported-id" })),
            object(json!({ "deviceId": "telemetry-id" })),
        )
        .expect("merge");
        assert_eq!(record.device_id, "tree-id");
        assert!(record.extra("deviceId").is_none());
    }

    #[test]
    fn known_keys_are_typed() {
        let record = DeviceRecord::merge(
            "dev-1",
            object(json!({
                "active": 1,
                "light": false,
                "targetTemp": "85",
                "statusCodes": 1902,
                "displayName": "Garden sauna"
            })),
            object(json!({ "temperature": 69.5, "remainingTime": 42 })),
        )
        .expect("merge");

        assert_eq!(record.active, Some(true));
        assert_eq!(record.light, Some(false));
        assert_eq!(record.target_temp, Some(Number::from(85)));
        assert_eq!(record.temperature, Number::from_f64(69.5));
        assert_eq!(record.remaining_time, Some(42));
        assert_eq!(record.status_codes.as_deref(), Some("1902"));
        assert_eq!(record.display_name.as_deref(), Some("Garden sauna"));
        assert!(record.fan.is_none());
    }

    #[test]
    fn unreadable_known_values_are_kept_raw() {
        let record = DeviceRecord::merge(
            "dev-1",
            object(json!({ "remainingTime": "soon", "light": "maybe", "targetTemp": 80 })),
            object(json!({ "timestamp": "2026-10-05T09:04:03Z", "temperature": [69, 70] })),
        )
        .expect("merge");

        assert!(record.remaining_time.is_none());
        assert!(record.light.is_none());
        assert!(record.timestamp.is_none());
        assert!(record.temperature.is_none());
        assert_eq!(record.extra("remainingTime"), Some(&json!("soon")));
        assert_eq!(record.extra("light"), Some(&json!("maybe")));
        assert_eq!(record.extra("timestamp"), Some(&json!("2026-10-05T09:04:03Z")));
        assert_eq!(record.extra("temperature"), Some(&json!([69, 70])));
        assert_eq!(record.target_temp, Some(Number::from(80)));

        let value = serde_json::to_value(&record).expect("json");
        assert_eq!(value["remainingTime"], json!("soon"));
        assert_eq!(value["timestamp"], json!("2026-10-05T09:04:03Z"));
        assert_eq!(value["targetTemp"], json!(80));
    }

    #[test]
    fn skipped_devices_are_hidden_when_empty() {
        let listing = DeviceListing::default();
        assert_eq!(serde_json::to_value(&listing).expect("json"), json!({ "devices": [] }));
    }
}
