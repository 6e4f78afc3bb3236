// Lenient field decoders for vendor payloads.
//
// The backend is loose about scalar types: flags arrive as 0/1, booleans,
// or strings, and numbers sometimes arrive quoted. These helpers accept any
// of those shapes and yield `None` for values they cannot interpret.
// Numbers keep their JSON form, so an integer reading stays an integer.

use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};

/// The scalar kind a typed field expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    Flag,
    Number,
    Integer,
    Text,
}

impl Shape {
    /// Whether the matching decoder can read `value`. `null` reads as absent.
    pub(crate) fn accepts(self, value: &Value) -> bool {
        value.is_null()
            || match self {
                Self::Flag => truthy(value).is_some(),
                Self::Number => as_number(value).is_some(),
                Self::Integer => as_i64(value).is_some(),
                Self::Text => matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_)),
            }
    }
}

pub(crate) fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    Ok(Option::<Value>::deserialize(d)?.as_ref().and_then(truthy))
}

pub(crate) fn number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Number>, D::Error> {
    Ok(Option::<Value>::deserialize(d)?.as_ref().and_then(as_number))
}

pub(crate) fn integer<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    Ok(Option::<Value>::deserialize(d)?.as_ref().and_then(as_i64))
}

/// Strings pass through; numbers are rendered in their JSON form.
pub(crate) fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn truthy(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n
            .as_i64()
            .map(|i| i != 0)
            .or_else(|| n.as_f64().map(|f| f.abs() > f64::EPSILON)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "" | "0" | "false" | "off" => Some(false),
            "1" | "true" | "on" => Some(true),
            other => other.parse::<f64>().ok().map(|f| f.abs() > f64::EPSILON),
        },
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn as_number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(Number::from)
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(Number::from_f64))
        }
        _ => None,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn flags_accept_numbers_bools_and_strings() {
        assert_eq!(truthy(&json!(1)), Some(true));
        assert_eq!(truthy(&json!(0)), Some(false));
        assert_eq!(truthy(&json!(true)), Some(true));
        assert_eq!(truthy(&json!("0")), Some(false));
        assert_eq!(truthy(&json!("on")), Some(true));
        assert_eq!(truthy(&json!(null)), None);
        assert_eq!(truthy(&json!({ "nested": 1 })), None);
    }

    #[test]
    fn numbers_accept_quoted_values() {
        assert_eq!(as_number(&json!("69.5")), Number::from_f64(69.5));
        assert_eq!(as_number(&json!("70")), Some(Number::from(70)));
        assert_eq!(as_i64(&json!("45")), Some(45));
        assert_eq!(as_i64(&json!("n/a")), None);
        assert_eq!(as_number(&json!("NaN")), None);
    }

    #[test]
    fn numbers_keep_their_json_form() {
        assert_eq!(Value::from(as_number(&json!(70)).expect("number")), json!(70));
        assert_eq!(Value::from(as_number(&json!(69.5)).expect("number")), json!(69.5));
    }

    #[test]
    fn shapes_reject_what_their_decoder_drops() {
        assert!(Shape::Integer.accepts(&json!("42")));
        assert!(!Shape::Integer.accepts(&json!("soon")));
        assert!(!Shape::Number.accepts(&json!([1, 2])));
        assert!(!Shape::Flag.accepts(&json!("maybe")));
        assert!(!Shape::Text.accepts(&json!({ "a": 1 })));
        assert!(Shape::Flag.accepts(&json!(null)));
    }
}
