//! Flat key-value records.
//!
//! A [`Record`] maps field names to scalar [`Value`]s. Records are built by
//! the input boundary (CSV/JSON loaders, HTTP payloads) and treated as
//! immutable by the detection core. Field lookup is total: asking for a
//! field the record does not have yields [`Value::Missing`] rather than an
//! error, which is what makes match keys well-defined for ragged data.

pub mod value;

pub use value::Value;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

static MISSING: Value = Value::Missing;

/// A single flat record: field name to scalar value.
///
/// Fields are kept in a sorted map so serialized output is deterministic
/// regardless of the order the loader inserted them.
///
/// # Example
///
/// ```
/// use recdupe::record::{Record, Value};
///
/// let record: Record = [("email", Value::text("a@example.com"))]
///     .into_iter()
///     .collect();
///
/// assert_eq!(record.get("email"), &Value::text("a@example.com"));
/// assert_eq!(record.get("phone"), &Value::Missing);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field value, replacing any previous value for the name.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Look up a field value.
    ///
    /// Total: fields the record does not carry come back as
    /// [`Value::Missing`], so callers never need to distinguish "absent"
    /// from "present but null" themselves.
    #[must_use]
    pub fn get(&self, field: &str) -> &Value {
        self.fields.get(field).unwrap_or(&MISSING)
    }

    /// Check whether the record carries a field under this name.
    ///
    /// Unlike [`Record::get`], this distinguishes an absent field from one
    /// explicitly set to [`Value::Missing`].
    #[must_use]
    pub fn contains_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Number of fields in the record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the record has no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in sorted order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// All (name, value) pairs in sorted field-name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        write!(f, "}}")
    }
}
