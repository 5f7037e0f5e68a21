//! Scalar field values.
//!
//! Records hold flat scalar values only: text, numbers, booleans, and an
//! explicit missing marker. `Value` implements structural equality, hashing,
//! and a stable total order (variant rank first, natural order within a
//! variant) so match keys can be used directly in hash maps and sorted
//! output.

use std::cmp::Ordering;
use std::fmt;

use ordered_float::OrderedFloat;
use serde::ser::{Serialize, Serializer};

/// A single scalar field value.
///
/// `Missing` is the canonical marker for an absent field. It is distinct
/// from the empty string and from zero, and two missing values are equal to
/// each other.
///
/// Numbers are wrapped in [`OrderedFloat`] so `Value` is `Eq + Hash + Ord`
/// despite holding floats. NaN compares equal to itself under this order,
/// which keeps grouping well-defined even for pathological inputs.
///
/// # Example
///
/// ```
/// use recdupe::record::Value;
///
/// assert_eq!(Value::text("alice"), Value::text("alice"));
/// assert_ne!(Value::Missing, Value::text(""));
/// assert_ne!(Value::Missing, Value::number(0.0));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    /// Field absent from the record (or JSON `null`).
    #[default]
    Missing,
    /// Boolean.
    Bool(bool),
    /// Numeric (integers and floats share one representation).
    Number(OrderedFloat<f64>),
    /// Text (stored raw; no trimming or case folding).
    Text(String),
}

impl Value {
    /// Create a text value.
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Create a numeric value.
    #[must_use]
    pub fn number(n: f64) -> Self {
        Value::Number(OrderedFloat(n))
    }

    /// Check whether this is the missing marker.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Human-readable name of the value's type, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Missing => "missing",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
        }
    }

    /// Natural comparison between two values of the same type.
    ///
    /// Returns `None` when the types differ, leaving the caller to decide
    /// whether that is an error (master selection treats it as one). Two
    /// missing values compare equal; a missing value is never naturally
    /// ordered against a present one.
    ///
    /// # Example
    ///
    /// ```
    /// use std::cmp::Ordering;
    /// use recdupe::record::Value;
    ///
    /// let a = Value::number(2.0);
    /// let b = Value::number(10.0);
    /// assert_eq!(a.compare_natural(&b), Some(Ordering::Less));
    /// assert_eq!(a.compare_natural(&Value::text("10")), None);
    /// ```
    #[must_use]
    pub fn compare_natural(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Missing, Value::Missing) => Some(Ordering::Equal),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Number(a), Value::Number(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => write!(f, "<missing>"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => {
                // Whole numbers print without the trailing ".0" so CSV
                // round-trips read naturally (42, not 42.0).
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", n.0 as i64)
                } else {
                    write!(f, "{}", n.0)
                }
            }
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(OrderedFloat(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(OrderedFloat(n as f64))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Missing => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => serializer.serialize_f64(n.0),
            Value::Text(s) => serializer.serialize_str(s),
        }
    }
}
