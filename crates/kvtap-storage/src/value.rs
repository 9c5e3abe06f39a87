//! Values held by a storage engine

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::kind::ValueKind;

/// A value stored under a key, tagged by its [`ValueKind`]
///
/// Serializes to plain JSON (no tag), so `Number(42)` renders as `42` and
/// `String("hi")` as `"hi"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredValue {
    String(String),
    Number(Number),
    Object(Map<String, Value>),
    Array(Vec<Value>),
    Boolean(bool),
}

impl StoredValue {
    /// The category this value is dispatched under
    pub fn kind(&self) -> ValueKind {
        match self {
            StoredValue::String(_) => ValueKind::String,
            StoredValue::Number(_) => ValueKind::Number,
            StoredValue::Object(_) => ValueKind::Object,
            StoredValue::Array(_) => ValueKind::Array,
            StoredValue::Boolean(_) => ValueKind::Boolean,
        }
    }

    /// Convert a JSON value into a stored value
    ///
    /// Returns `None` for `null`, which no category can hold.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(StoredValue::Boolean(b)),
            Value::Number(n) => Some(StoredValue::Number(n)),
            Value::String(s) => Some(StoredValue::String(s)),
            Value::Array(items) => Some(StoredValue::Array(items)),
            Value::Object(map) => Some(StoredValue::Object(map)),
        }
    }

    /// Convert into a plain JSON value
    pub fn to_json(&self) -> Value {
        match self {
            StoredValue::String(s) => Value::String(s.clone()),
            StoredValue::Number(n) => Value::Number(n.clone()),
            StoredValue::Object(map) => Value::Object(map.clone()),
            StoredValue::Array(items) => Value::Array(items.clone()),
            StoredValue::Boolean(b) => Value::Bool(*b),
        }
    }
}

impl From<String> for StoredValue {
    fn from(value: String) -> Self {
        StoredValue::String(value)
    }
}

impl From<&str> for StoredValue {
    fn from(value: &str) -> Self {
        StoredValue::String(value.to_string())
    }
}

impl From<bool> for StoredValue {
    fn from(value: bool) -> Self {
        StoredValue::Boolean(value)
    }
}

impl From<i64> for StoredValue {
    fn from(value: i64) -> Self {
        StoredValue::Number(value.into())
    }
}

impl From<u64> for StoredValue {
    fn from(value: u64) -> Self {
        StoredValue::Number(value.into())
    }
}

impl From<Map<String, Value>> for StoredValue {
    fn from(value: Map<String, Value>) -> Self {
        StoredValue::Object(value)
    }
}

impl From<Vec<Value>> for StoredValue {
    fn from(value: Vec<Value>) -> Self {
        StoredValue::Array(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(StoredValue::from("x").kind(), ValueKind::String);
        assert_eq!(StoredValue::from(7i64).kind(), ValueKind::Number);
        assert_eq!(StoredValue::from(true).kind(), ValueKind::Boolean);
        assert_eq!(StoredValue::from(Vec::<Value>::new()).kind(), ValueKind::Array);
        assert_eq!(StoredValue::from(Map::new()).kind(), ValueKind::Object);
    }

    #[test]
    fn test_serializes_untagged() {
        assert_eq!(serde_json::to_string(&StoredValue::from(42i64)).unwrap(), "42");
        assert_eq!(serde_json::to_string(&StoredValue::from("hi")).unwrap(), "\"hi\"");
        assert_eq!(serde_json::to_string(&StoredValue::from(false)).unwrap(), "false");
    }

    #[test]
    fn test_from_json_rejects_null() {
        assert!(StoredValue::from_json(Value::Null).is_none());
    }

    #[test]
    fn test_from_json_picks_kind() {
        let value = StoredValue::from_json(json!({"a": [1, 2]})).unwrap();
        assert_eq!(value.kind(), ValueKind::Object);
        assert_eq!(value.to_json(), json!({"a": [1, 2]}));

        let value = StoredValue::from_json(json!([true])).unwrap();
        assert_eq!(value.kind(), ValueKind::Array);
    }
}
