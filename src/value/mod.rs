//! Runtime value model for the schema engine.
//!
//! Every value the engine can validate or construct is a `Value`. The enum is
//! closed: primitive kinds (string, number, boolean, symbol, function), the
//! 64-bit integer wrapper classes, the five named structured-object wrapper
//! classes, sequences, and ordered records.
//!
//! # Design principles
//!
//! - Values are plain data; no value carries registry state
//! - JSON documents convert losslessly into values (`From<serde_json::Value>`)
//! - All JSON numbers map to the `number` primitive; integer wrappers are
//!   only produced explicitly (by factories or callers)
//! - Equality is structural; function values compare by identity

mod flags;
mod wrappers;

pub use flags::FlagSet;
pub use wrappers::{construct_class, Money};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Primitive kind tags declarable on a domain, plus reporting-only tags.
///
/// The seven domain-declarable kinds are `String` through `Symbol`;
/// `Sequence` and `Null` only appear when reporting an actual value's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueKind {
    /// UTF-8 string
    String,
    /// 64-bit floating point number
    Number,
    /// Exact integer (64-bit wrapper classes)
    Integer,
    /// Boolean
    Boolean,
    /// Structured object (wrapper classes, records, flag sets)
    Struct,
    /// Opaque callable
    Function,
    /// Opaque symbol
    Symbol,
    /// Ordered sequence (reporting only)
    Sequence,
    /// Null / empty (reporting only)
    Null,
}

impl ValueKind {
    /// Returns the kind name used in error details.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Integer => "integer",
            ValueKind::Boolean => "boolean",
            ValueKind::Struct => "struct",
            ValueKind::Function => "function",
            ValueKind::Symbol => "symbol",
            ValueKind::Sequence => "sequence",
            ValueKind::Null => "null",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An opaque callable value. The engine never inspects it, only reports its
/// kind; two function values are equal only if they share the same allocation.
#[derive(Clone)]
pub struct FnValue(Arc<dyn Fn(Value) -> Value + Send + Sync>);

impl FnValue {
    /// Wraps a callable as a value.
    pub fn new(f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Invokes the callable.
    pub fn call(&self, value: Value) -> Value {
        (self.0)(value)
    }
}

impl fmt::Debug for FnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[function]")
    }
}

impl PartialEq for FnValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent / empty marker
    Null,
    /// Boolean
    Bool(bool),
    /// The `number` primitive; all JSON numbers land here
    Float(f64),
    /// Signed 64-bit exact-integer wrapper (`Int64`)
    Int(i64),
    /// Unsigned 64-bit wrapper (`Uint64`); link identifiers, raw flag bits
    Uint(u64),
    /// The `string` primitive
    Str(String),
    /// Opaque symbol
    Symbol(String),
    /// Ordered sequence
    Sequence(Vec<Value>),
    /// Plain keyed object preserving insertion order
    Record(Vec<(String, Value)>),
    /// Bit-set wrapper class
    Flags(FlagSet),
    /// Monetary value wrapper class
    Money(Money),
    /// Byte buffer wrapper class
    Bytes(Vec<u8>),
    /// Keyed map wrapper class
    Dict(BTreeMap<String, Value>),
    /// Value set wrapper class
    Group(Vec<Value>),
    /// Calendar timestamp wrapper class
    Timestamp(DateTime<Utc>),
    /// Opaque callable
    Function(FnValue),
}

impl Value {
    /// Builds a record from key/value pairs.
    pub fn record(pairs: impl IntoIterator<Item = (impl Into<String>, Value)>) -> Self {
        Value::Record(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Reports the primitive kind tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Float(_) => ValueKind::Number,
            Value::Int(_) | Value::Uint(_) => ValueKind::Integer,
            Value::Str(_) => ValueKind::String,
            Value::Symbol(_) => ValueKind::Symbol,
            Value::Sequence(_) => ValueKind::Sequence,
            Value::Record(_)
            | Value::Flags(_)
            | Value::Money(_)
            | Value::Bytes(_)
            | Value::Dict(_)
            | Value::Group(_)
            | Value::Timestamp(_) => ValueKind::Struct,
            Value::Function(_) => ValueKind::Function,
        }
    }

    /// Reports the wrapper class name of this value.
    pub fn class_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Boolean",
            Value::Float(_) => "Number",
            Value::Int(_) => "Int64",
            Value::Uint(_) => "Uint64",
            Value::Str(_) => "String",
            Value::Symbol(_) => "Symbol",
            Value::Sequence(_) => "Sequence",
            Value::Record(_) => "Record",
            Value::Flags(_) => "Flags",
            Value::Money(_) => "Money",
            Value::Bytes(_) => "Bytes",
            Value::Dict(_) => "Dict",
            Value::Group(_) => "Group",
            Value::Timestamp(_) => "Timestamp",
            Value::Function(_) => "Function",
        }
    }

    /// Returns a length-like measure where one exists.
    pub fn length(&self) -> Option<usize> {
        match self {
            Value::Str(s) => Some(s.chars().count()),
            Value::Sequence(v) | Value::Group(v) => Some(v.len()),
            Value::Record(pairs) => Some(pairs.len()),
            Value::Bytes(b) => Some(b.len()),
            Value::Dict(m) => Some(m.len()),
            _ => None,
        }
    }

    /// Whether this value is the empty marker.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Record field lookup; `None` for non-records and absent keys.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Record(pairs) => pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Converts to a JSON value for surfacing to callers.
    ///
    /// Wrapper classes collapse to their natural JSON representation;
    /// function values have none and serialize as a marker string.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::{json, Map, Number};
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => json!(b),
            Value::Float(f) => Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Int(i) => json!(i),
            Value::Uint(u) => json!(u),
            Value::Str(s) | Value::Symbol(s) => json!(s),
            Value::Sequence(v) | Value::Group(v) => {
                serde_json::Value::Array(v.iter().map(Value::to_json).collect())
            }
            Value::Record(pairs) => {
                let mut map = Map::new();
                for (k, v) in pairs {
                    map.insert(k.clone(), v.to_json());
                }
                serde_json::Value::Object(map)
            }
            Value::Flags(f) => json!(f.bits()),
            Value::Money(m) => json!(m.to_string()),
            Value::Bytes(b) => {
                use base64::Engine;
                json!(base64::engine::general_purpose::STANDARD.encode(b))
            }
            Value::Dict(m) => {
                let mut map = Map::new();
                for (k, v) in m {
                    map.insert(k.clone(), v.to_json());
                }
                serde_json::Value::Object(map)
            }
            Value::Timestamp(t) => json!(t.to_rfc3339()),
            Value::Function(_) => json!("[function]"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(v) => {
                Value::Sequence(v.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Record(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_numbers_map_to_number_kind() {
        let v = Value::from(json!(200));
        assert_eq!(v.kind(), ValueKind::Number);
        let v = Value::from(json!(1.5));
        assert_eq!(v.kind(), ValueKind::Number);
    }

    #[test]
    fn test_integer_wrappers_share_kind() {
        assert_eq!(Value::Int(-1).kind(), ValueKind::Integer);
        assert_eq!(Value::Uint(1).kind(), ValueKind::Integer);
        assert_eq!(Value::Int(-1).class_name(), "Int64");
        assert_eq!(Value::Uint(1).class_name(), "Uint64");
    }

    #[test]
    fn test_record_preserves_order() {
        let v = Value::from(json!({"b": 1, "a": 2}));
        match &v {
            Value::Record(pairs) => {
                assert_eq!(pairs[0].0, "b");
                assert_eq!(pairs[1].0, "a");
            }
            other => panic!("expected record, got {:?}", other),
        }
        assert_eq!(v.get("a"), Some(&Value::Float(2.0)));
        assert_eq!(v.get("c"), None);
    }

    #[test]
    fn test_length_measures() {
        assert_eq!(Value::Str("héllo".into()).length(), Some(5));
        assert_eq!(Value::Bytes(vec![1, 2, 3]).length(), Some(3));
        assert_eq!(Value::Bool(true).length(), None);
    }

    #[test]
    fn test_function_identity_equality() {
        let f = FnValue::new(|v| v);
        let g = FnValue::new(|v| v);
        assert_eq!(f.clone(), f);
        assert_ne!(f, g);
    }

    #[test]
    fn test_to_json_round_trip_record() {
        let v = Value::record([("name", Value::from("Ann")), ("age", Value::Float(30.0))]);
        assert_eq!(v.to_json(), json!({"name": "Ann", "age": 30.0}));
    }
}
