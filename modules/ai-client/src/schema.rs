use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Types a model can be asked to emit as JSON.
///
/// Blanket-implemented for anything that is `JsonSchema + DeserializeOwned`.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// Strict-mode schema: every object closed, every property required,
    /// no `$ref` left behind.
    fn strict_schema() -> Value {
        let mut root = serde_json::to_value(schema_for!(Self)).unwrap_or_default();
        let definitions = match &mut root {
            Value::Object(map) => {
                map.remove("$schema");
                map.remove("definitions").unwrap_or(Value::Null)
            }
            _ => Value::Null,
        };
        strict(&mut root, &definitions);
        root
    }

    fn type_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

/// Resolve one node into its strict form, recursing depth-first.
fn strict(node: &mut Value, definitions: &Value) {
    match node {
        Value::Object(map) => {
            if let Some(resolved) = resolve(map, definitions) {
                *node = resolved;
                strict(node, definitions);
                return;
            }
            if map.get("type").and_then(Value::as_str) == Some("object") {
                close_object(map);
            }
            for child in map.values_mut() {
                strict(child, definitions);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|item| strict(item, definitions)),
        _ => {}
    }
}

/// The schema a `$ref` or single-element `allOf` stands for.
fn resolve(map: &Map<String, Value>, definitions: &Value) -> Option<Value> {
    if let Some(name) = map
        .get("$ref")
        .and_then(Value::as_str)
        .and_then(|r| r.strip_prefix("#/definitions/"))
    {
        return definitions.get(name).cloned();
    }
    match map.get("allOf").and_then(Value::as_array) {
        Some(parts) if parts.len() == 1 => parts.first().cloned(),
        _ => None,
    }
}

fn close_object(map: &mut Map<String, Value>) {
    map.insert("additionalProperties".into(), Value::Bool(false));
    let required: Option<Vec<Value>> = map
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| props.keys().cloned().map(Value::String).collect());
    if let Some(required) = required {
        map.insert("required".into(), Value::Array(required));
    }
}
