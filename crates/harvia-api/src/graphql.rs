// GraphQL request shape and response-envelope helpers.
//
// The gateway itself (`HarviaClient::execute`) returns the decoded envelope
// untouched, `errors` array included. The helpers here are for callers that
// want to dig a value out of `data` or decode one of the string-encoded
// JSON payloads the backend likes to return.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Error;

/// A GraphQL request body: `{operationName, variables, query}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlOperation {
    pub operation_name: String,
    pub variables: Map<String, Value>,
    pub query: String,
}

impl GraphqlOperation {
    pub fn new(operation_name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            variables: Map::new(),
            query: query.into(),
        }
    }

    /// Add (or replace) a variable.
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }
}

/// Walk `path` from the envelope root, e.g. `["data", "getDeviceState", "reported"]`.
///
/// A missing step or an explicit `null` is reported as [`Error::MissingField`]
/// naming the dotted path.
pub fn field<'a>(envelope: &'a Value, path: &[&str]) -> Result<&'a Value, Error> {
    let mut current = envelope;
    for step in path {
        current = match current.get(*step) {
            Some(Value::Null) | None => {
                return Err(Error::MissingField {
                    field: path.join("."),
                });
            }
            Some(next) => next,
        };
    }
    Ok(current)
}

/// Decode a string-valued field that carries JSON.
pub fn embedded_json(value: &Value, name: &str) -> Result<Value, Error> {
    let raw = value.as_str().ok_or_else(|| Error::MissingField {
        field: format!("{name} (expected a JSON string)"),
    })?;
    serde_json::from_str(raw).map_err(|source| Error::EmbeddedJson {
        field: name.to_owned(),
        source,
    })
}

/// Decode a string-valued field that carries a JSON object.
pub fn embedded_object(value: &Value, name: &str) -> Result<Map<String, Value>, Error> {
    match embedded_json(value, name)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::Deserialization {
            message: format!("field '{name}' decoded to a non-object JSON value"),
            body: other.to_string(),
        }),
    }
}

/// The `errors` array of an envelope, if the backend sent one.
pub fn errors(envelope: &Value) -> Option<&Vec<Value>> {
    envelope.get("errors").and_then(Value::as_array)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn operation_serializes_in_graphql_shape() {
        let op = GraphqlOperation::new("Query", "query Query { getDeviceTree }")
            .variable("deviceId", "abc");
        assert_eq!(
            serde_json::to_value(&op).expect("json"),
            json!({
                "operationName": "Query",
                "variables": { "deviceId": "abc" },
                "query": "query Query { getDeviceTree }"
            })
        );
    }

    #[test]
    fn field_reports_dotted_path() {
        let envelope = json!({ "data": { "getDeviceState": null } });
        match field(&envelope, &["data", "getDeviceState", "reported"]) {
            Err(Error::MissingField { field }) => {
                assert_eq!(field, "data.getDeviceState.reported");
            }
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn embedded_object_decodes_string_payload() {
        let value = json!("{\"active\":1,\"targetTemp\":80}");
        let map = embedded_object(&value, "reported").expect("object");
        assert_eq!(map.get("targetTemp"), Some(&json!(80)));
    }

    #[test]
    fn embedded_json_rejects_garbage() {
        let value = json!("{not json");
        assert!(matches!(
            embedded_json(&value, "data"),
            Err(Error::EmbeddedJson { .. })
        ));
    }

    #[test]
    fn errors_array_is_exposed() {
        let envelope = json!({ "data": null, "errors": [{ "message": "Unauthorized" }] });
        assert_eq!(errors(&envelope).map(Vec::len), Some(1));
        assert!(errors(&json!({ "data": {} })).is_none());
    }
}
