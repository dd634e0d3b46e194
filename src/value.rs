//! Cell values and rows shared by the table log, validator, and live-edit
//! overlay. A row is a map from column name to `Value`; the table log keeps
//! rows this way (rather than a columnar Arrow-style layout) because every
//! consumer in this crate walks rows one at a time — the "columnar" part of
//! "versioned columnar log" lives in the schema and column-typing rules, not
//! in the in-memory representation.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A single cell value. Deliberately small and closed: the column-type table
/// in spec §4.2 (`string|integer|number|boolean`, defaulting to string) is
/// the full set of native types the adapter needs to reason about.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

impl Value {
    pub fn type_name(&self) -> ColumnType {
        match self {
            Value::Null => ColumnType::String,
            Value::Bool(_) => ColumnType::Boolean,
            Value::Integer(_) => ColumnType::Integer,
            Value::Number(_) => ColumnType::Number,
            Value::Text(_) => ColumnType::String,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// `IS NOT DISTINCT FROM` semantics: two nulls are equal.
    pub fn null_equal(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Integer(a), Value::Number(b)) | (Value::Number(b), Value::Integer(a)) => {
                (*a as f64) == *b
            }
            _ => self == other,
        }
    }

    pub fn to_canonical_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(v) => v.to_string(),
            Value::Integer(v) => v.to_string(),
            Value::Number(v) => v.to_string(),
            Value::Text(v) => v.clone(),
        }
    }

    pub fn cast_to(&self, target: ColumnType) -> Value {
        if self.type_name() == target {
            return self.clone();
        }
        if self.is_null() {
            return Value::Null;
        }
        match target {
            ColumnType::String => Value::Text(self.to_canonical_string()),
            ColumnType::Integer => match self {
                Value::Number(v) if v.fract() == 0.0 => Value::Integer(*v as i64),
                Value::Text(s) => s
                    .parse::<i64>()
                    .map(Value::Integer)
                    .unwrap_or_else(|_| Value::Text(s.clone())),
                other => Value::Text(other.to_canonical_string()),
            },
            ColumnType::Number => match self {
                Value::Integer(v) => Value::Number(*v as f64),
                Value::Text(s) => s
                    .parse::<f64>()
                    .map(Value::Number)
                    .unwrap_or_else(|_| Value::Text(s.clone())),
                other => Value::Text(other.to_canonical_string()),
            },
            ColumnType::Boolean => match self {
                Value::Text(s) if s.eq_ignore_ascii_case("true") => Value::Bool(true),
                Value::Text(s) if s.eq_ignore_ascii_case("false") => Value::Bool(false),
                other => Value::Text(other.to_canonical_string()),
            },
        }
    }

    pub fn from_json(value: &JsonValue) -> Value {
        match value {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else {
                    Value::Number(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            JsonValue::String(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Integer(i) => JsonValue::from(*i),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::Text(s) => JsonValue::String(s.clone()),
        }
    }

    pub fn partial_cmp_for_order(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Null, _) => Some(Ordering::Less),
            (_, Value::Null) => Some(Ordering::Greater),
            (a, b) if a.as_f64().is_some() && b.as_f64().is_some() => {
                a.as_f64().partial_cmp(&b.as_f64())
            }
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Integer,
    Number,
    Boolean,
}

impl ColumnType {
    /// Converts a JSON-Schema-style `{type: ...}` declaration, defaulting
    /// unknown or `["null", T]` array types to `T`, and everything else to
    /// string (spec §4.2 `ensure_table`).
    pub fn from_json_schema_type(declared: Option<&JsonValue>) -> ColumnType {
        let scalar = match declared {
            Some(JsonValue::String(s)) => Some(s.as_str()),
            Some(JsonValue::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str())
                .find(|item| *item != "null"),
            _ => None,
        };
        match scalar {
            Some("integer") => ColumnType::Integer,
            Some("number") => ColumnType::Number,
            Some("boolean") => ColumnType::Boolean,
            _ => ColumnType::String,
        }
    }
}

/// A row is an ordered map so column order is stable across serialisation;
/// `BTreeMap` also gives us the "all columns" comparison `append_dedup`
/// needs for free via structural equality.
pub type Row = BTreeMap<String, Value>;

pub fn row_from_json_object(object: &serde_json::Map<String, JsonValue>) -> Row {
    object
        .iter()
        .map(|(k, v)| (k.clone(), Value::from_json(v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_equal_treats_two_nulls_as_equal() {
        assert!(Value::Null.null_equal(&Value::Null));
        assert!(!Value::Null.null_equal(&Value::Integer(0)));
    }

    #[test]
    fn cast_to_string_uses_canonical_form() {
        assert_eq!(
            Value::Integer(42).cast_to(ColumnType::String),
            Value::Text("42".to_string())
        );
    }

    #[test]
    fn cast_failure_falls_back_to_string() {
        assert_eq!(
            Value::Text("not-a-number".to_string()).cast_to(ColumnType::Integer),
            Value::Text("not-a-number".to_string())
        );
    }

    #[test]
    fn schema_type_defaults_unknown_to_string() {
        assert_eq!(
            ColumnType::from_json_schema_type(Some(&JsonValue::String("date".into()))),
            ColumnType::String
        );
        assert_eq!(
            ColumnType::from_json_schema_type(Some(&serde_json::json!(["null", "integer"]))),
            ColumnType::Integer
        );
        assert_eq!(ColumnType::from_json_schema_type(None), ColumnType::String);
    }
}
