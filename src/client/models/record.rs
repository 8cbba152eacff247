//! Schema-less collection records

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One remote record: field name to value, in server key order.
pub type Record = serde_json::Map<String, Value>;

/// Identifier of a record, normalised to its string form.
///
/// The portal uses integer ids for most collections and hashes for samples,
/// so both numeric and string identifiers are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build an id from a JSON value. Only strings and numbers qualify.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }

    /// Read the identifier stored under `id_field` in a record.
    pub fn of(record: &Record, id_field: &str) -> Option<Self> {
        record.get(id_field).and_then(Self::from_value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Acknowledgement returned by mutating endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ack {
    /// Human readable confirmation
    #[serde(default)]
    pub message: String,

    /// Identifier assigned by the server on create
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

/// Parse a command-line value into a record field value.
///
/// Numbers, `true`, `false` and `null` become JSON scalars; everything else
/// is kept as a string.
pub fn parse_field_value(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        _ => match serde_json::from_str::<serde_json::Number>(raw) {
            Ok(n) => Value::Number(n),
            Err(_) => Value::String(raw.to_string()),
        },
    }
}

/// Render a field value for a table cell.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_id_from_number_and_string() {
        assert_eq!(RecordId::from_value(&json!(42)), Some(RecordId::new("42")));
        assert_eq!(
            RecordId::from_value(&json!("abc")),
            Some(RecordId::new("abc"))
        );
        assert_eq!(RecordId::from_value(&json!("")), None);
        assert_eq!(RecordId::from_value(&json!(null)), None);
        assert_eq!(RecordId::from_value(&json!(true)), None);
    }

    #[test]
    fn test_record_id_of_record() {
        let record = json!({"id": 7, "name": "CERT-EU"});
        let record = record.as_object().unwrap();

        assert_eq!(RecordId::of(record, "id"), Some(RecordId::new("7")));
        assert_eq!(RecordId::of(record, "uuid"), None);
    }

    #[test]
    fn test_record_preserves_key_order() {
        let record: Record = serde_json::from_str(r#"{"zeta": 1, "alpha": 2, "mid": 3}"#).unwrap();
        let keys: Vec<&str> = record.keys().map(String::as_str).collect();

        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_parse_field_value() {
        assert_eq!(parse_field_value("12"), json!(12));
        assert_eq!(parse_field_value("1.5"), json!(1.5));
        assert_eq!(parse_field_value("true"), json!(true));
        assert_eq!(parse_field_value("null"), json!(null));
        assert_eq!(parse_field_value("CERT-EU"), json!("CERT-EU"));
        assert_eq!(parse_field_value(""), json!(""));
    }

    #[test]
    fn test_ack_without_id() {
        let ack: Ack = serde_json::from_str(r#"{"message": "Organization saved"}"#).unwrap();
        assert_eq!(ack.message, "Organization saved");
        assert!(ack.id.is_none());
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!(null)), "");
        assert_eq!(display_value(&json!("x")), "x");
        assert_eq!(display_value(&json!(3)), "3");
        assert_eq!(display_value(&json!(false)), "false");
    }
}
