//! Value extraction
//!
//! Pulls literal run-time values out of value-producing sub-trees: constants,
//! one member of a captured object, and collections for membership tests.
//! Extraction is pure; every other shape fails with `UnsupportedExpression`.

use crate::data::error::CompileError;

use super::expr::Expr;
use super::value::Value;

/// Evaluate a value-producing expression
pub fn extract_value(expr: &Expr) -> Result<Value, CompileError> {
    match expr {
        Expr::Constant { value } => Ok(value.clone()),
        Expr::Member { target, member } => match target.as_ref() {
            Expr::Captured { name, members } => members.get(member).cloned().ok_or_else(|| {
                CompileError::expression(format!("captured '{}' has no member '{}'", name, member))
            }),
            Expr::Member { .. } => Err(CompileError::expression(format!(
                "{} (only one level of member access on a captured value is supported)",
                expr
            ))),
            _ => Err(CompileError::expression(format!(
                "{} cannot be evaluated to a value",
                expr
            ))),
        },
        other => Err(CompileError::expression(format!(
            "{} cannot be evaluated to a value",
            other
        ))),
    }
}

/// Evaluate an expression that must yield a collection
pub fn extract_collection(expr: &Expr) -> Result<Vec<Value>, CompileError> {
    match extract_value(expr)? {
        Value::List(items) => Ok(items),
        other => Err(CompileError::expression(format!(
            "{} is a {}, not a collection",
            expr,
            other.type_name()
        ))),
    }
}
