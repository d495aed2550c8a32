//! Evaluation results for configuration expressions.
//!
//! The value model mirrors what the template engine can produce, plus
//! [`Value::Dynamic`] for results that cannot be resolved yet (for example an
//! object whose key is still unknown). Sequences evaluate to tuples rather
//! than homogeneous lists, and objects preserve source order.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::fmt;

/// All possible results of expression evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(hcl::Number),
    String(String),
    Tuple(Vec<Value>),
    Object(IndexMap<String, Value>),
    /// A value that is not resolvable with the information at hand.
    Dynamic,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Value::Dynamic)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<hcl::Number> {
        match self {
            Value::Number(n) => Some(n.clone()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(entries) => Some(entries),
            _ => None,
        }
    }

    /// The string form of this value when used as an object key.
    ///
    /// Strings convert as themselves, booleans and numbers via their
    /// canonical text form. Everything else has no key form.
    pub fn as_object_key(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Tuple(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Object(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key} = {value}")?;
                }
                f.write_str("}")
            }
            Value::Dynamic => f.write_str("(dynamic)"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(hcl::Number::from(value))
    }
}

impl From<hcl::Number> for Value {
    fn from(value: hcl::Number) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Tuple(value.into_iter().map(Into::into).collect())
    }
}

impl<V: Into<Value>> From<IndexMap<String, V>> for Value {
    fn from(value: IndexMap<String, V>) -> Self {
        Value::Object(value.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl From<hcl::Value> for Value {
    fn from(value: hcl::Value) -> Self {
        match value {
            hcl::Value::Null => Value::Null,
            hcl::Value::Bool(b) => Value::Bool(b),
            hcl::Value::Number(n) => Value::Number(n),
            hcl::Value::String(s) => Value::String(s),
            hcl::Value::Array(items) => {
                Value::Tuple(items.into_iter().map(Value::from).collect())
            }
            hcl::Value::Object(entries) => Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl serde::ser::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null | Value::Dynamic => serializer.serialize_unit(),
            Value::Bool(value) => serializer.serialize_bool(*value),
            Value::Number(value) => value.serialize(serializer),
            Value::String(value) => serializer.serialize_str(value),
            Value::Tuple(items) => {
                let mut ser = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    ser.serialize_element(item)?;
                }
                ser.end()
            }
            Value::Object(entries) => {
                let mut ser = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    ser.serialize_entry(key, value)?;
                }
                ser.end()
            }
        }
    }
}
