// ── Unit conversion and input validation ──
//
// The backend works in whole degrees Celsius; users think in Fahrenheit.
// Inputs are validated here, before anything goes over the wire.

use crate::error::CoreError;

pub const MIN_TARGET_F: f64 = 104.0;
pub const MAX_TARGET_F: f64 = 230.0;
pub const MIN_HUMIDITY_PCT: i64 = 0;
pub const MAX_HUMIDITY_PCT: i64 = 140;

const TEMPERATURE_RANGE_MSG: &str = "Temperature must be between 104°F and 230°F (40-110°C)";
const HUMIDITY_RANGE_MSG: &str = "Humidity must be between 0% and 140%";

/// Validate a Fahrenheit target and convert it to whole degrees Celsius.
///
/// Halves round to even.
#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
pub fn fahrenheit_to_celsius(fahrenheit: f64) -> Result<i64, CoreError> {
    if !(MIN_TARGET_F..=MAX_TARGET_F).contains(&fahrenheit) {
        return Err(CoreError::ValidationFailed {
            message: TEMPERATURE_RANGE_MSG.into(),
        });
    }
    let celsius = ((fahrenheit - 32.0) * 5.0 / 9.0).round_ties_even();
    // 104..=230 °F maps to 40..=110 °C, so the cast cannot truncate.
    Ok(celsius as i64)
}

/// Celsius reading to Fahrenheit, rounded to one decimal.
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    ((celsius * 9.0 / 5.0 + 32.0) * 10.0).round_ties_even() / 10.0
}

/// Validate a target relative humidity.
pub fn validate_humidity(pct: i64) -> Result<i64, CoreError> {
    if (MIN_HUMIDITY_PCT..=MAX_HUMIDITY_PCT).contains(&pct) {
        Ok(pct)
    } else {
        Err(CoreError::ValidationFailed {
            message: HUMIDITY_RANGE_MSG.into(),
        })
    }
}
