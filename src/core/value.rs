//! Database value types
//!
//! This module defines the values that flow between fields, records, queries
//! and the database drivers.

use serde::{Deserialize, Serialize};

/// Database value that can hold different types
///
/// Serialized untagged, so a value appears in JSON as the bare number,
/// string or `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DatabaseValue {
    /// Null value
    Null,
    /// 64-bit integer
    Integer(i64),
    /// 64-bit floating point
    Real(f64),
    /// String value
    Text(String),
}

impl DatabaseValue {
    /// Get the value as an i32
    pub fn as_int(&self) -> Option<i32> {
        match self {
            DatabaseValue::Integer(v) => i32::try_from(*v).ok(),
            DatabaseValue::Real(v) => Some(*v as i32),
            DatabaseValue::Text(s) => s.parse().ok(),
            DatabaseValue::Null => None,
        }
    }

    /// Get the value as an i64
    pub fn as_long(&self) -> Option<i64> {
        match self {
            DatabaseValue::Integer(v) => Some(*v),
            DatabaseValue::Real(v) => Some(*v as i64),
            DatabaseValue::Text(s) => s.parse().ok(),
            DatabaseValue::Null => None,
        }
    }

    /// Get the value as an f64
    pub fn as_double(&self) -> Option<f64> {
        match self {
            DatabaseValue::Real(v) => Some(*v),
            DatabaseValue::Integer(v) => Some(*v as f64),
            DatabaseValue::Text(s) => s.parse().ok(),
            DatabaseValue::Null => None,
        }
    }

    /// Get the value as a string (zero-copy for Text values)
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DatabaseValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get the value as a string (with conversion)
    pub fn as_string(&self) -> String {
        match self {
            DatabaseValue::Null => "null".to_string(),
            DatabaseValue::Integer(v) => v.to_string(),
            DatabaseValue::Real(v) => v.to_string(),
            DatabaseValue::Text(s) => s.clone(),
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, DatabaseValue::Null)
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            DatabaseValue::Null => "null",
            DatabaseValue::Integer(_) => "integer",
            DatabaseValue::Real(_) => "real",
            DatabaseValue::Text(_) => "text",
        }
    }
}

impl From<i32> for DatabaseValue {
    fn from(v: i32) -> Self {
        DatabaseValue::Integer(i64::from(v))
    }
}

impl From<i64> for DatabaseValue {
    fn from(v: i64) -> Self {
        DatabaseValue::Integer(v)
    }
}

impl From<f64> for DatabaseValue {
    fn from(v: f64) -> Self {
        DatabaseValue::Real(v)
    }
}

impl From<String> for DatabaseValue {
    fn from(v: String) -> Self {
        DatabaseValue::Text(v)
    }
}

impl From<&str> for DatabaseValue {
    fn from(v: &str) -> Self {
        DatabaseValue::Text(v.to_string())
    }
}

impl<T: Into<DatabaseValue>> From<Option<T>> for DatabaseValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => DatabaseValue::Null,
        }
    }
}

/// One result row, positionally aligned with the cursor's columns
pub type DatabaseRow = Vec<DatabaseValue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_conversions() {
        let val = DatabaseValue::Integer(42);
        assert_eq!(val.as_int(), Some(42));
        assert_eq!(val.as_long(), Some(42));
        assert_eq!(val.as_double(), Some(42.0));
        assert_eq!(val.as_string(), "42");

        let val = DatabaseValue::Text("123".to_string());
        assert_eq!(val.as_long(), Some(123));
        assert_eq!(val.as_str(), Some("123"));

        assert_eq!(DatabaseValue::Null.as_long(), None);
        assert_eq!(DatabaseValue::Integer(i64::MAX).as_int(), None);
    }

    #[test]
    fn test_value_from_types() {
        let val: DatabaseValue = 42.into();
        assert_eq!(val, DatabaseValue::Integer(42));

        let val: DatabaseValue = "hello".into();
        assert_eq!(val, DatabaseValue::Text("hello".to_string()));

        let val: DatabaseValue = Some(2.5).into();
        assert_eq!(val, DatabaseValue::Real(2.5));

        let val: DatabaseValue = Option::<i64>::None.into();
        assert_eq!(val, DatabaseValue::Null);
    }

    #[test]
    fn test_value_type_name() {
        assert_eq!(DatabaseValue::Null.type_name(), "null");
        assert_eq!(DatabaseValue::Integer(1).type_name(), "integer");
        assert_eq!(DatabaseValue::Real(1.0).type_name(), "real");
        assert_eq!(DatabaseValue::Text("x".to_string()).type_name(), "text");
    }

    #[test]
    fn test_value_serializes_untagged() {
        let values = vec![
            DatabaseValue::Null,
            DatabaseValue::Integer(7),
            DatabaseValue::Text("a".to_string()),
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[null,7,"a"]"#);

        let back: Vec<DatabaseValue> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, values);
    }
}
