//! Decoding of provider output into raw graphs.
//!
//! Providers are asked for a strict schema but routinely deviate: properties
//! arrive as key/value arrays or JSON-encoded strings, a node's real type may
//! hide inside its properties, and the whole payload may be wrapped in a
//! Markdown code fence. Everything here is lenient about those deviations and
//! strict about the overall shape.

use atlas_core::{KnowledgeGraph, Node, Properties, Relationship, DEFAULT_RELATIONSHIP_TYPE};
use serde_json::Value;

use crate::error::{ExtractError, Result};

/// Decode a provider's text response into a raw graph.
pub fn decode_graph_text(text: &str) -> Result<KnowledgeGraph> {
    let body = strip_code_fence(text);
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ExtractError::Decode(format!("output is not JSON: {e}")))?;
    decode_graph_value(&value)
}

pub fn decode_graph_value(value: &Value) -> Result<KnowledgeGraph> {
    let root = value
        .as_object()
        .ok_or_else(|| ExtractError::Decode("graph must be a JSON object".into()))?;

    let nodes = array_field(root, "nodes")?
        .iter()
        .enumerate()
        .map(|(i, v)| decode_node(v).map_err(|e| at("nodes", i, e)))
        .collect::<Result<Vec<_>>>()?;

    let relationships = array_field(root, "relationships")?
        .iter()
        .enumerate()
        .map(|(i, v)| decode_relationship(v).map_err(|e| at("relationships", i, e)))
        .collect::<Result<Vec<_>>>()?;

    Ok(KnowledgeGraph {
        nodes,
        relationships,
        doc_entity_roots: Vec::new(),
    })
}

/// Normalize the property shapes providers emit into a JSON object.
///
/// Accepts an object, a `[{"key", "value"}]` array, or a string holding a
/// JSON object. Anything else, and an empty key/value array, is absent.
pub fn coerce_properties(value: Option<&Value>) -> Option<Properties> {
    match value? {
        Value::Object(map) => Some(map.clone()),
        Value::Array(entries) => {
            let mut map = Properties::new();
            for entry in entries {
                let Some(key) = entry.get("key").and_then(Value::as_str).map(str::trim) else {
                    continue;
                };
                if key.is_empty() {
                    continue;
                }
                let value = entry.get("value").map(coerce_scalar).unwrap_or(Value::Null);
                map.insert(key.to_string(), value);
            }
            (!map.is_empty()).then_some(map)
        }
        Value::String(s) => match serde_json::from_str::<Value>(s.trim()) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        },
        _ => None,
    }
}

/// String values that are themselves JSON are unpacked; other strings are
/// trimmed.
fn coerce_scalar(value: &Value) -> Value {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Value::String(String::new());
            }
            serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
        }
        other => other.clone(),
    }
}

/// Strip one surrounding Markdown code fence, with or without a language tag.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn decode_node(value: &Value) -> Result<Node> {
    let obj = value
        .as_object()
        .ok_or_else(|| ExtractError::Decode("node must be an object".into()))?;
    let id = match obj.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(ExtractError::Decode("node is missing a string id".into())),
    };
    let declared = obj.get("type").and_then(Value::as_str).unwrap_or_default();
    let properties = coerce_properties(obj.get("properties"));
    let (node_type, properties) = lift_type(declared, properties);

    Ok(Node {
        id,
        node_type,
        properties,
    })
}

fn decode_relationship(value: &Value) -> Result<Relationship> {
    let obj = value
        .as_object()
        .ok_or_else(|| ExtractError::Decode("relationship must be an object".into()))?;
    let endpoint = |name: &str| -> Result<Node> {
        let v = obj
            .get(name)
            .ok_or_else(|| ExtractError::Decode(format!("relationship is missing {name}")))?;
        decode_node(v)
    };
    let source = endpoint("source")?;
    let target = endpoint("target")?;
    let rel_type = obj
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_RELATIONSHIP_TYPE)
        .to_string();

    Ok(Relationship {
        source,
        target,
        rel_type,
        properties: coerce_properties(obj.get("properties")),
    })
}

/// A non-blank string `type` inside the properties overrides the declared
/// type and is removed from the properties.
fn lift_type(declared: &str, properties: Option<Properties>) -> (String, Option<Properties>) {
    let Some(mut props) = properties else {
        return (declared.to_string(), None);
    };
    let lifted = match props.get("type") {
        Some(Value::String(t)) if !t.trim().is_empty() => t.trim().to_string(),
        _ => return (declared.to_string(), Some(props)),
    };
    props.remove("type");
    (lifted, (!props.is_empty()).then_some(props))
}

fn array_field<'a>(root: &'a serde_json::Map<String, Value>, name: &str) -> Result<&'a Vec<Value>> {
    root.get(name)
        .and_then(Value::as_array)
        .ok_or_else(|| ExtractError::Decode(format!("graph is missing the {name} array")))
}

fn at(field: &str, index: usize, err: ExtractError) -> ExtractError {
    match err {
        ExtractError::Decode(msg) => ExtractError::Decode(format!("{field}[{index}]: {msg}")),
        other => other,
    }
}
