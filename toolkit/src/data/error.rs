//! Error types for the data layer
//!
//! `CompileError` covers every way a predicate can fail to compile. All of
//! them are programmer errors in predicate construction: they are raised
//! before any SQL text or parameter is produced and are never retried.
//!
//! `StatementError` covers statement assembly around a compiled predicate and
//! wraps `CompileError` unchanged.

use thiserror::Error;

/// Predicate compilation error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// Expression shape the compiler cannot translate
    #[error("Unsupported expression: {0}")]
    UnsupportedExpression(String),

    /// Operator with no SQL counterpart
    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    /// Method call with no SQL counterpart
    #[error("Unsupported method: '{0}' method is not supported")]
    UnsupportedMethod(String),

    /// Field path deeper than one level of nesting
    #[error("Unsupported nesting: '{0}' (only one degree of nesting is supported)")]
    UnsupportedNesting(String),

    /// Field not declared by the attached entity schema
    #[error("Unknown field '{field}' for table {table}")]
    UnknownField { field: String, table: String },
}

impl CompileError {
    /// Create an unsupported expression error naming the offending fragment
    pub fn expression(fragment: impl Into<String>) -> Self {
        Self::UnsupportedExpression(fragment.into())
    }

    /// Create an unsupported operator error naming the offending operator
    pub fn operator(fragment: impl Into<String>) -> Self {
        Self::UnsupportedOperator(fragment.into())
    }

    /// Create an unsupported method error naming the offending method
    pub fn method(name: impl Into<String>) -> Self {
        Self::UnsupportedMethod(name.into())
    }

    /// Create an unsupported nesting error naming the offending path
    pub fn nesting(path: impl Into<String>) -> Self {
        Self::UnsupportedNesting(path.into())
    }

    /// Create an unknown field error
    pub fn unknown_field(field: impl Into<String>, table: impl Into<String>) -> Self {
        Self::UnknownField {
            field: field.into(),
            table: table.into(),
        }
    }

    /// The fragment of the predicate this error refers to
    pub fn fragment(&self) -> &str {
        match self {
            Self::UnsupportedExpression(f)
            | Self::UnsupportedOperator(f)
            | Self::UnsupportedMethod(f)
            | Self::UnsupportedNesting(f) => f,
            Self::UnknownField { field, .. } => field,
        }
    }
}

/// Statement assembly error
#[derive(Error, Debug)]
pub enum StatementError {
    /// The WHERE predicate failed to compile
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Operation needs key columns but the schema declares none
    #[error("Table {table} has no key columns")]
    MissingKey { table: String },

    /// Operation needs exactly one key column
    #[error("Table {table} has a composite key ({count} columns); use a predicate instead")]
    CompositeKey { table: String, count: usize },

    /// Column name not declared by the schema
    #[error("Unknown column '{column}' for table {table}")]
    UnknownColumn { column: String, table: String },

    /// Operation resolved to an empty column list
    #[error("No columns to {operation} for table {table}")]
    NoColumns {
        table: String,
        operation: &'static str,
    },

    /// Soft delete requested on a table without a soft-delete column
    #[error("Table {table} does not support soft delete")]
    SoftDeleteUnsupported { table: String },

    /// Row value missing for a column the statement binds
    #[error("Row for table {table} has no value for column '{column}'")]
    MissingValue { table: String, column: String },

    /// Row did not serialize into a flat object of scalar values
    #[error("Row for table {table} cannot be bound: {reason}")]
    InvalidRow { table: String, reason: String },

    /// Row serialization failed
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// SQL references a parameter that was never supplied
    #[error("Unknown parameter @{0}")]
    UnknownParameter(String),
}

impl StatementError {
    /// Create a missing key error
    pub fn missing_key(table: &str) -> Self {
        Self::MissingKey {
            table: table.to_string(),
        }
    }

    /// Create an unknown column error
    pub fn unknown_column(column: &str, table: &str) -> Self {
        Self::UnknownColumn {
            column: column.to_string(),
            table: table.to_string(),
        }
    }

    /// Create a no columns error
    pub fn no_columns(table: &str, operation: &'static str) -> Self {
        Self::NoColumns {
            table: table.to_string(),
            operation,
        }
    }

    /// Create an invalid row error
    pub fn invalid_row(table: &str, reason: impl Into<String>) -> Self {
        Self::InvalidRow {
            table: table.to_string(),
            reason: reason.into(),
        }
    }

    /// Check if this error originates from predicate compilation
    pub fn is_compile(&self) -> bool {
        matches!(self, Self::Compile(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_method_display() {
        let err = CompileError::method("Trim");
        assert_eq!(
            err.to_string(),
            "Unsupported method: 'Trim' method is not supported"
        );
    }

    #[test]
    fn test_unsupported_nesting_display() {
        let err = CompileError::nesting("A.B.C");
        assert_eq!(
            err.to_string(),
            "Unsupported nesting: 'A.B.C' (only one degree of nesting is supported)"
        );
    }

    #[test]
    fn test_fragment() {
        assert_eq!(CompileError::operator("Add").fragment(), "Add");
        assert_eq!(CompileError::expression("x + 1").fragment(), "x + 1");
        assert_eq!(
            CompileError::unknown_field("Nickname", "Users").fragment(),
            "Nickname"
        );
    }

    #[test]
    fn test_compile_error_is_transparent() {
        let err: StatementError = CompileError::nesting("A.B.C").into();
        assert!(err.is_compile());
        assert_eq!(
            err.to_string(),
            "Unsupported nesting: 'A.B.C' (only one degree of nesting is supported)"
        );
    }

    #[test]
    fn test_statement_error_display() {
        assert_eq!(
            StatementError::missing_key("Users").to_string(),
            "Table Users has no key columns"
        );
        assert_eq!(
            StatementError::no_columns("Users", "update").to_string(),
            "No columns to update for table Users"
        );
        assert_eq!(
            StatementError::unknown_column("Nope", "Users").to_string(),
            "Unknown column 'Nope' for table Users"
        );
        assert!(!StatementError::missing_key("Users").is_compile());
    }
}
