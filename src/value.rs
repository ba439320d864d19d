use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A node's data mapping: output or input key to value.
pub type DataMap = BTreeMap<String, Value>;

/// Largest integer an `f64` represents exactly.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Runtime value carried along edges.
///
/// Only `Number` takes part in arithmetic. Everything else a payload may hold
/// (strings, booleans, arrays, objects, null) is carried verbatim as `Other`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Other(serde_json::Value),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Other(_) => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Other(serde_json::Value::Null))
    }

    /// Merges a value arriving on another edge into the one already bound to
    /// the same input key. Two numbers add up; any other pairing keeps the
    /// incoming value (last writer wins).
    pub fn accumulate(&self, incoming: &Value) -> Value {
        match (self, incoming) {
            (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
            _ => incoming.clone(),
        }
    }

    /// Output overlay: a declared default shifted by a same-named input.
    /// Non-numeric pairs leave the default untouched.
    pub fn overlay(default: &Value, input: Option<&Value>) -> Value {
        match (default, input) {
            (Value::Number(d), Some(Value::Number(i))) => Value::Number(d + i),
            _ => default.clone(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Number(n) => number_to_json(*n),
            Value::Other(v) => v.clone(),
        }
    }
}

fn is_integral(n: f64) -> bool {
    n.is_finite() && n.fract() == 0.0 && n.abs() < MAX_EXACT_INT
}

fn number_to_json(n: f64) -> serde_json::Value {
    if is_integral(n) {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Other(serde_json::Value::String(s.to_string()))
    }
}

/// Integers outside `±MAX_EXACT_INT` have no exact `f64` and stay `Other`.
impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v.as_f64() {
            Some(n) if v.is_f64() || n.abs() <= MAX_EXACT_INT => Value::Number(n),
            _ => Value::Other(v),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => {
                if is_integral(*n) {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Other(v) => write!(f, "{}", v),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Number(n) if is_integral(*n) => serializer.serialize_i64(*n as i64),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Other(v) => v.serialize(serializer),
        }
    }
}

// Self-describing formats only; binary snapshots go through `store::snapshot`.
impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

/// Builds a `DataMap` from `(key, value)` pairs.
pub fn data_map<K, V, I>(entries: I) -> DataMap
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integral_numbers_stay_integers_on_the_wire() {
        let map = data_map([("a", 12.0), ("b", 0.5)]);
        let text = serde_json::to_string(&map).unwrap();
        assert_eq!(text, r#"{"a":12,"b":0.5}"#);
    }

    #[test]
    fn json_numbers_become_numeric_values() {
        let v: Value = serde_json::from_value(json!(7)).unwrap();
        assert_eq!(v, Value::Number(7.0));
        let s: Value = serde_json::from_value(json!("seven")).unwrap();
        assert_eq!(s, Value::Other(json!("seven")));
    }

    #[test]
    fn integers_beyond_f64_precision_are_kept_verbatim() {
        let big: Value = serde_json::from_str("18014398509481985").unwrap();
        assert_eq!(big, Value::Other(json!(18014398509481985u64)));
        assert_eq!(big.to_string(), "18014398509481985");

        let edge: Value = serde_json::from_str("-9007199254740992").unwrap();
        assert_eq!(edge, Value::Number(-9_007_199_254_740_992.0));
    }

    #[test]
    fn accumulate_is_numeric_or_last_wins() {
        let five = Value::Number(5.0);
        assert_eq!(five.accumulate(&Value::Number(7.0)), Value::Number(12.0));
        assert_eq!(five.accumulate(&Value::from("x")), Value::from("x"));
        assert_eq!(Value::from("x").accumulate(&five), five);
    }
}
