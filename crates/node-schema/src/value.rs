//! Live parameter values
//!
//! Every node instance owns a `ValueStore`: the per-instance values of its
//! storage-backed parameters, keyed by parameter identifier. Sockets that are
//! not linked render and edit these values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ParamValue {
    Float(f64),
    Int(i64),
    Bool(bool),
    /// Fixed-size float arrays (vectors, colors, matrices)
    FloatArray(Vec<f64>),
    String(String),
    /// Identifier of the selected enum item
    Enum(String),
}

impl ParamValue {
    /// Whether two values have the same variant (and array length)
    pub fn same_shape(&self, other: &ParamValue) -> bool {
        match (self, other) {
            (ParamValue::FloatArray(a), ParamValue::FloatArray(b)) => a.len() == b.len(),
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(v) | ParamValue::Enum(v) => Some(v),
            _ => None,
        }
    }

    /// Plain JSON form, as accepted by storage keyword options
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ParamValue::Float(v) => serde_json::json!(v),
            ParamValue::Int(v) => serde_json::json!(v),
            ParamValue::Bool(v) => serde_json::json!(v),
            ParamValue::FloatArray(v) => serde_json::json!(v),
            ParamValue::String(v) | ParamValue::Enum(v) => serde_json::json!(v),
        }
    }
}

/// Per-instance parameter values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueStore {
    values: BTreeMap<String, ParamValue>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, identifier: &str) -> Option<&ParamValue> {
        self.values.get(identifier)
    }

    /// Set a value, returning the previous one
    pub fn set(&mut self, identifier: impl Into<String>, value: ParamValue) -> Option<ParamValue> {
        self.values.insert(identifier.into(), value)
    }

    pub fn remove(&mut self, identifier: &str) -> Option<ParamValue> {
        self.values.remove(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.values.contains_key(identifier)
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_shape() {
        assert!(ParamValue::Float(1.0).same_shape(&ParamValue::Float(2.0)));
        assert!(!ParamValue::Float(1.0).same_shape(&ParamValue::Int(1)));
        let three = ParamValue::FloatArray(vec![0.0; 3]);
        assert!(three.same_shape(&ParamValue::FloatArray(vec![1.0; 3])));
        assert!(!three.same_shape(&ParamValue::FloatArray(vec![0.0; 4])));
    }

    #[test]
    fn test_value_serialization() {
        let json = serde_json::to_value(ParamValue::Float(0.5)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "float", "value": 0.5}));
        assert_eq!(ParamValue::Enum("ADD".into()).to_json(), serde_json::json!("ADD"));
    }

    #[test]
    fn test_store_set_returns_previous() {
        let mut store = ValueStore::new();
        assert!(store.set("factor", ParamValue::Float(0.5)).is_none());
        assert_eq!(
            store.set("factor", ParamValue::Float(1.0)),
            Some(ParamValue::Float(0.5))
        );
        assert_eq!(store.get("factor").and_then(|v| v.as_f64()), Some(1.0));
        assert_eq!(store.len(), 1);
    }
}
