//! Column inference for schema-less collections

use serde::Serialize;
use serde_json::Value;

use crate::client::models::Record;

/// Field seeded when an add starts on a grid with no columns
pub const DEFAULT_FIELD: &str = "name";

/// Ordered list of editable columns, inferred from data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Schema {
    fields: Vec<String>,
}

impl Schema {
    #[cfg(test)]
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    /// Infer columns from the first record of a collection.
    ///
    /// Keeps the record's key order and drops the identifier field, the
    /// exclusion set, and nested objects or arrays (not editable as a cell).
    pub fn infer(first: &Record, id_field: &str, exclude: &[String]) -> Self {
        let fields = first
            .iter()
            .filter(|(key, _)| key.as_str() != id_field)
            .filter(|(key, _)| !exclude.iter().any(|x| x == *key))
            .filter(|(_, value)| is_flat(value))
            .map(|(key, _)| key.clone())
            .collect();

        Self { fields }
    }

    /// Seed the default column when nothing was inferred.
    pub fn ensure_default(&mut self) {
        if self.fields.is_empty() {
            self.fields.push(DEFAULT_FIELD.to_string());
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn is_flat(value: &Value) -> bool {
    !matches!(value, Value::Object(_) | Value::Array(_))
}
