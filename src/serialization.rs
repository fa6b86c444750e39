//! Output shaping: field projection and removal of empty values.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::CrudError;

/// `null`, `""`, `[]` and `{}`.
#[must_use]
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Recursively remove empty values from objects and lists.
///
/// Children are cleaned before their parent is checked, so an object that only held empty
/// values disappears too. Keys listed in `keep` survive even when empty.
#[must_use]
pub fn strip_empty(value: Value, keep: &[&str]) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, child)| (key, strip_empty(child, keep)))
                .filter(|(key, child)| keep.contains(&key.as_str()) || !is_empty_value(child))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| strip_empty(item, keep))
                .filter(|item| !is_empty_value(item))
                .collect(),
        ),
        other => other,
    }
}

/// Keep only `only` keys of an object, or of every object in a list.
#[must_use]
pub fn project(value: Value, only: &[String]) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| only.iter().any(|field| field == key))
                .collect::<Map<_, _>>(),
        ),
        Value::Array(items) => {
            Value::Array(items.into_iter().map(|item| project(item, only)).collect())
        }
        other => other,
    }
}

/// Serialize, project to `only` (when given) and strip empty values.
///
/// # Errors
///
/// Returns [`CrudError::Validation`] if `value` cannot be represented as JSON.
pub fn dump<T: Serialize + ?Sized>(
    value: &T,
    only: Option<&[String]>,
    keep: &[&str],
) -> Result<Value, CrudError> {
    let value = serde_json::to_value(value)
        .map_err(|e| CrudError::validation(format!("Could not serialize output: {e}")))?;
    let value = match only {
        Some(fields) if !fields.is_empty() => project(value, fields),
        _ => value,
    };
    Ok(strip_empty(value, keep))
}
