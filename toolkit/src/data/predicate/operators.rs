//! Operator mapping
//!
//! Maps comparison, logical and method node kinds to SQL operator tokens.
//! The mapping is closed: anything outside the known set fails instead of
//! rendering something plausible but wrong.

use crate::data::error::CompileError;

use super::expr::BinaryOp;
use super::value::Value;

/// Logical operator linking a node to its preceding sibling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    /// Logical operator for a binary node kind, if it is one
    pub fn from_binary(op: BinaryOp) -> Option<Self> {
        match op {
            BinaryOp::And => Some(Self::And),
            BinaryOp::Or => Some(Self::Or),
            _ => None,
        }
    }
}

/// SQL token for a binary node kind; `None` is the absent top-level link
pub fn sql_operator(op: Option<BinaryOp>) -> Result<&'static str, CompileError> {
    let Some(op) = op else {
        return Ok("");
    };
    match op {
        BinaryOp::Eq => Ok("="),
        BinaryOp::Ne => Ok("!="),
        BinaryOp::Lt => Ok("<"),
        BinaryOp::Lte => Ok("<="),
        BinaryOp::Gt => Ok(">"),
        BinaryOp::Gte => Ok(">="),
        BinaryOp::And => Ok("AND"),
        BinaryOp::Or => Ok("OR"),
        other => Err(CompileError::operator(format!("'{}' isn't supported", other))),
    }
}

/// Known method names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    StartsWith,
    EndsWith,
    /// Substring match on a string field
    StringContains,
    /// Collection membership
    Contains,
    Exists,
    Any,
    All,
}

impl Method {
    /// Resolve a method name as written in the predicate
    pub fn from_name(name: &str) -> Result<Self, CompileError> {
        match name {
            "StartsWith" => Ok(Self::StartsWith),
            "EndsWith" => Ok(Self::EndsWith),
            "StringContains" => Ok(Self::StringContains),
            "Contains" => Ok(Self::Contains),
            "Exists" => Ok(Self::Exists),
            "Any" => Ok(Self::Any),
            "All" => Ok(Self::All),
            _ => Err(CompileError::method(name)),
        }
    }

    /// String-match methods, rendered as LIKE
    pub fn is_pattern_match(&self) -> bool {
        matches!(self, Self::StartsWith | Self::EndsWith | Self::StringContains)
    }
}

/// SQL token for a method call, flipping polarity under negation
pub fn method_operator(method: Method, negated: bool) -> &'static str {
    match (method, negated) {
        (Method::Any, _) => "ANY",
        (Method::All, _) => "ALL",
        (m, false) if m.is_pattern_match() => "LIKE",
        (m, true) if m.is_pattern_match() => "NOT LIKE",
        (_, false) => "IN",
        (_, true) => "NOT IN",
    }
}

/// Build the LIKE pattern bound for a string-match method
///
/// Null is matched as the empty string. With `escape` set, `%`, `_` and `\`
/// in the value are escaped so they match literally.
pub fn like_pattern(method: Method, value: &Value, escape: bool) -> Result<String, CompileError> {
    let text = match value {
        Value::List(_) => {
            return Err(CompileError::expression(format!(
                "{:?} cannot match a list value",
                method
            )));
        }
        other => other.to_string(),
    };
    let text = if escape {
        crate::utils::sql::escape_like_pattern(&text)
    } else {
        text
    };

    match method {
        Method::StartsWith => Ok(format!("{}%", text)),
        Method::EndsWith => Ok(format!("%{}", text)),
        Method::StringContains => Ok(format!("%{}%", text)),
        other => Err(CompileError::method(format!("{:?}", other))),
    }
}
