// ── Device tree ──
//
// `getDeviceTree` returns a JSON-encoded forest. Only the children of the
// first root are devices; each child's `i.name` is its device id.

use serde::Deserialize;
use serde_json::Value;

use crate::error::CoreError;

#[derive(Debug, Deserialize)]
struct RootNode {
    #[serde(default)]
    c: Vec<ChildNode>,
}

#[derive(Debug, Deserialize)]
struct ChildNode {
    i: NodeInfo,
}

#[derive(Debug, Deserialize)]
struct NodeInfo {
    name: String,
}

/// Device ids in tree order. An empty tree yields an empty list.
pub fn device_ids(tree: Value) -> Result<Vec<String>, CoreError> {
    let empty = match &tree {
        Value::Null => true,
        Value::Array(roots) => roots.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::String(s) => s.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    };
    if empty {
        return Ok(Vec::new());
    }

    let roots: Vec<RootNode> = serde_json::from_value(tree)
        .map_err(|e| CoreError::malformed(format!("unexpected device tree shape: {e}")))?;

    Ok(roots
        .into_iter()
        .next()
        .map(|root| root.c.into_iter().map(|child| child.i.name).collect())
        .unwrap_or_default())
}
