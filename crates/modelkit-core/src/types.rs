//! Column type tags.

use std::fmt;

use serde_json::Value as JsonValue;

use crate::value::Value;

/// Semantic type tag of a stored column.
///
/// This is a closed set. The textual form returned by [`SqlType::tag`] is the
/// `type` entry of the public schema description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    /// Unbounded text.
    Text,
    /// Bounded text, `VARCHAR(n)`.
    Varchar(u32),
    /// 64-bit integer.
    Integer,
    /// Boolean.
    Boolean,
    /// Floating point.
    Real,
    /// JSON document that must be an object or a list.
    Json,
    /// Single JSON-encoded entry of any shape.
    JsonEntry,
}

impl SqlType {
    /// Public type tag (`TEXT`, `VARCHAR(64)`, `INTEGER`, `JSON`, ...).
    #[must_use]
    pub fn tag(&self) -> String {
        match self {
            SqlType::Text => "TEXT".to_string(),
            SqlType::Varchar(n) => format!("VARCHAR({n})"),
            SqlType::Integer => "INTEGER".to_string(),
            SqlType::Boolean => "BOOLEAN".to_string(),
            SqlType::Real => "REAL".to_string(),
            SqlType::Json => "JSON".to_string(),
            SqlType::JsonEntry => "JSON_ENTRY".to_string(),
        }
    }

    /// Check whether a non-null value can be stored in a column of this type.
    ///
    /// NULL handling belongs to the column's nullability, not the type, so
    /// `Value::Null` is always accepted here.
    pub fn accepts(&self, value: &Value) -> Result<(), String> {
        let ok = match (self, value) {
            (_, Value::Null) => true,
            (SqlType::Text, Value::Text(_)) => true,
            (SqlType::Varchar(n), Value::Text(s)) => {
                if s.chars().count() > *n as usize {
                    return Err(format!("text longer than {n} characters"));
                }
                true
            }
            (SqlType::Integer, Value::BigInt(_)) => true,
            (SqlType::Boolean, Value::Bool(_)) => true,
            (SqlType::Real, Value::Double(_) | Value::BigInt(_)) => true,
            (SqlType::Json, Value::Json(JsonValue::Object(_) | JsonValue::Array(_))) => true,
            (SqlType::JsonEntry, _) => true,
            _ => false,
        };
        if ok {
            Ok(())
        } else if matches!(self, SqlType::Json) {
            Err(format!(
                "JSON object must be either an object or a list, not {}",
                value.type_name()
            ))
        } else {
            Err(format!("expected {}, got {}", self.tag(), value.type_name()))
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tags() {
        assert_eq!(SqlType::Varchar(64).tag(), "VARCHAR(64)");
        assert_eq!(SqlType::Json.tag(), "JSON");
        assert_eq!(SqlType::JsonEntry.tag(), "JSON_ENTRY");
    }

    #[test]
    fn test_json_requires_object_or_list() {
        assert!(SqlType::Json.accepts(&Value::Json(json!({"k": 1}))).is_ok());
        assert!(SqlType::Json.accepts(&Value::Json(json!([1]))).is_ok());
        let err = SqlType::Json.accepts(&Value::Text("nope".into())).unwrap_err();
        assert!(err.contains("object or a list"));
        assert!(SqlType::Json.accepts(&Value::Json(json!(5))).is_err());
    }

    #[test]
    fn test_json_entry_accepts_anything() {
        assert!(SqlType::JsonEntry.accepts(&Value::BigInt(3)).is_ok());
        assert!(SqlType::JsonEntry.accepts(&Value::Text("x".into())).is_ok());
    }

    #[test]
    fn test_varchar_length() {
        assert!(SqlType::Varchar(3).accepts(&Value::Text("abc".into())).is_ok());
        assert!(SqlType::Varchar(3).accepts(&Value::Text("abcd".into())).is_err());
        assert!(SqlType::Integer.accepts(&Value::Null).is_ok());
    }
}
