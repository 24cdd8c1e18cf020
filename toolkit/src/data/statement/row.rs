//! Reading column values out of entity rows

use serde::Serialize;
use serde_json::Map;

use crate::data::error::StatementError;
use crate::data::predicate::Value;

/// Serialized row, keyed by column name
pub(super) struct Row {
    table: String,
    fields: Map<String, serde_json::Value>,
}

impl Row {
    /// Serialize a row; it must become a JSON object
    pub(super) fn read<E: Serialize>(table: &str, row: &E) -> Result<Self, StatementError> {
        match serde_json::to_value(row)? {
            serde_json::Value::Object(fields) => Ok(Self {
                table: table.to_string(),
                fields,
            }),
            other => Err(StatementError::invalid_row(
                table,
                format!("expected an object, got {}", json_kind(&other)),
            )),
        }
    }

    /// Value bound for `column`
    pub(super) fn value(&self, column: &str) -> Result<Value, StatementError> {
        let raw = self
            .fields
            .get(column)
            .ok_or_else(|| StatementError::MissingValue {
                table: self.table.clone(),
                column: column.to_string(),
            })?;
        Value::from_json(raw.clone()).ok_or_else(|| {
            StatementError::invalid_row(
                &self.table,
                format!("column '{}' holds a nested object", column),
            )
        })
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a bool",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
