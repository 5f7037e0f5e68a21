//! JSON record parsing.
//!
//! Accepts a single array of flat objects. JSON types map directly onto
//! record values: strings stay text, numbers and booleans keep their
//! types, `null` becomes the missing marker. Nested arrays and objects
//! are structural errors, reported with the record index and field name.

use serde_json::{Map, Value as JsonValue};

use super::LoadError;
use crate::record::{Record, Value};

/// Parse JSON bytes into records.
///
/// # Errors
///
/// [`LoadError::Json`] for syntactically invalid input,
/// [`LoadError::NotAnArray`] / [`LoadError::NotAnObject`] for the wrong
/// shape, and [`LoadError::NonScalar`] for nested field values.
pub fn parse_json(bytes: &[u8]) -> Result<Vec<Record>, LoadError> {
    let root: JsonValue = serde_json::from_slice(bytes)?;
    let items = match root {
        JsonValue::Array(items) => items,
        other => {
            return Err(LoadError::NotAnArray {
                found: json_kind(&other),
            })
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            JsonValue::Object(object) => record_from_object(index, object),
            other => Err(LoadError::NotAnObject {
                index,
                found: json_kind(other),
            }),
        })
        .collect()
}

/// Convert one flat JSON object into a record.
///
/// Shared with the HTTP API, which receives objects that never passed
/// through a file.
///
/// # Errors
///
/// [`LoadError::NonScalar`] if any field holds an array or object.
pub fn record_from_object(
    index: usize,
    object: &Map<String, JsonValue>,
) -> Result<Record, LoadError> {
    let mut record = Record::new();
    for (field, value) in object {
        record.insert(field.clone(), scalar_value(index, field, value)?);
    }
    Ok(record)
}

fn scalar_value(index: usize, field: &str, value: &JsonValue) -> Result<Value, LoadError> {
    match value {
        JsonValue::Null => Ok(Value::Missing),
        JsonValue::Bool(b) => Ok(Value::Bool(*b)),
        // Without the arbitrary_precision feature every serde_json number
        // views as f64.
        JsonValue::Number(n) => Ok(Value::number(n.as_f64().unwrap_or_default())),
        JsonValue::String(s) => Ok(Value::text(s.clone())),
        JsonValue::Array(_) | JsonValue::Object(_) => Err(LoadError::NonScalar {
            index,
            field: field.to_string(),
            found: json_kind(value),
        }),
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
