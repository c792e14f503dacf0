// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Structured values.
//!
//! [`Value`] is the tree-shaped interchange form every record serializes to.
//! Snapshots, diffs and merges all operate on it, so records never have to be
//! compared field by field.
//!
//! # Example
//!
//! ```
//! use record_graph::Value;
//! use serde_json::json;
//!
//! let value = Value::from(json!({"name": "Dave", "rating": 9}));
//!
//! assert_eq!(value.get("name").and_then(Value::as_str), Some("Dave"));
//! assert_eq!(value.get("rating").and_then(Value::as_i64), Some(9));
//! assert!(value.get("missing").is_none());
//! ```

mod codec;
pub mod diff;

pub use diff::{diff, merge};

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Number;
use thiserror::Error;

/// Object body of a [`Value`]. Key order carries no meaning.
pub type Map = BTreeMap<String, Value>;

/// A tree-shaped structured value.
///
/// Equality is structural and recursive: two objects are equal when they
/// hold the same key set with equal values under each key. Numbers compare
/// by value, so `1` equals `1.0`.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Object(Map),
}

/// The kind tag of a [`Value`], used for shape comparisons and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Bytes,
    Array,
    Object,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool => write!(f, "bool"),
            Self::Number => write!(f, "number"),
            Self::String => write!(f, "string"),
            Self::Bytes => write!(f, "bytes"),
            Self::Array => write!(f, "array"),
            Self::Object => write!(f, "object"),
        }
    }
}

/// Errors raised while converting between records and [`Value`]s.
#[derive(Error, Debug)]
pub enum ValueError {
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("expected {expected}, found {found}")]
    Malformed { expected: ValueKind, found: ValueKind },
    #[error("missing field '{0}'")]
    MissingField(String),
}

impl Value {
    /// Build an object from key/value pairs.
    pub fn object<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Object(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    /// Look up a key on an object. Non-objects have no keys.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Look up a required key, failing with [`ValueError::MissingField`].
    pub fn require(&self, key: &str) -> Result<&Value, ValueError> {
        self.get(key).ok_or_else(|| ValueError::MissingField(key.to_string()))
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Convert to a `serde_json::Value`.
    ///
    /// Byte blobs become arrays of numbers, which is how serde encodes
    /// `Vec<u8>` in JSON, so [`from_value`] can read them back.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        self.to_json_with(&|bytes: &[u8]| {
            serde_json::Value::Array(bytes.iter().map(|b| serde_json::Value::from(*b)).collect())
        })
    }

    fn to_json_with(&self, bytes: &dyn Fn(&[u8]) -> serde_json::Value) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => bytes(b),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(|v| v.to_json_with(bytes)).collect())
            }
            Value::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json_with(bytes))).collect(),
            ),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

// `Number` never holds NaN.
impl Eq for Value {}

/// Integers compare exactly; anything involving a float goes through `f64`.
fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    if a.is_f64() || b.is_f64() {
        return a.as_f64() == b.as_f64();
    }
    false
}

impl fmt::Display for Value {
    /// Compact JSON, with byte blobs rendered as hex strings.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = self.to_json_with(&|bytes: &[u8]| serde_json::Value::String(hex::encode(bytes)));
        write!(f, "{json}")
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

macro_rules! from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Number(Number::from(n))
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl From<f64> for Value {
    /// Non-finite floats have no structured representation and become null.
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Serialize any serde type into a [`Value`].
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, ValueError> {
    Ok(Value::from(serde_json::to_value(value)?))
}

/// Deserialize a [`Value`] into any serde type.
pub fn from_value<T: DeserializeOwned>(value: &Value) -> Result<T, ValueError> {
    Ok(serde_json::from_value(value.to_json())?)
}

/// Assign a field from a representation if it is present.
///
/// An absent key leaves `target` untouched. A null only assigns when the
/// target type accepts null (such as `Option<T>`); otherwise it is ignored,
/// so a tombstone never clobbers a required field.
pub fn assign<T: DeserializeOwned>(target: &mut T, value: Option<&Value>) -> Result<(), ValueError> {
    match value {
        None => Ok(()),
        Some(Value::Null) => {
            if let Ok(cleared) = from_value(&Value::Null) {
                *target = cleared;
            }
            Ok(())
        }
        Some(value) => {
            *target = from_value(value)?;
            Ok(())
        }
    }
}
