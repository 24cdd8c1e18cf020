//! Predicate expression tree and builder combinators
//!
//! An `Expr` describes a boolean filter over one record. It is built either
//! with the combinators in this module or deserialized from JSON, then handed
//! to the compiler.
//!
//! ```
//! use predsql::data::predicate::{compile, field};
//!
//! let predicate = field("Age").gt(10).and(field("Name").starts_with("Jo"));
//! let query = compile(&predicate).unwrap();
//! assert_eq!(query.sql, "Age > @Age_p0 AND Name LIKE @Name_p1");
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::ops;

use serde::{Deserialize, Serialize};

use super::value::Value;

/// Binary node kinds
///
/// Only comparisons and `And`/`Or` have SQL counterparts; the arithmetic and
/// bitwise kinds are rejected by the operator mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    And,
    Or,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    BitAnd,
    BitOr,
    Xor,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::And => "&&",
            Self::Or => "||",
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::Xor => "^",
        };
        f.write_str(s)
    }
}

/// Predicate expression node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    /// Read of a record field (`Name`, or `Address.City` one level deep)
    Field { path: String },
    /// Literal value
    Constant { value: Value },
    /// Host object captured by the predicate, holding named values
    Captured {
        name: String,
        members: BTreeMap<String, Value>,
    },
    /// Member access on a captured object or a field
    Member { target: Box<Expr>, member: String },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Not { operand: Box<Expr> },
    /// Method call; without a target the first argument is the receiver
    Call {
        method: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<Box<Expr>>,
        #[serde(default)]
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn constant(value: impl Into<Value>) -> Self {
        Self::Constant {
            value: value.into(),
        }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn member(target: Expr, member: impl Into<String>) -> Self {
        Self::Member {
            target: Box::new(target),
            member: member.into(),
        }
    }

    /// Instance method call on `target`
    pub fn call(method: impl Into<String>, target: Expr, args: Vec<Expr>) -> Self {
        Self::Call {
            method: method.into(),
            target: Some(Box::new(target)),
            args,
        }
    }

    /// Static-style method call (`Contains(list, x.Field)`)
    pub fn call_static(method: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::Call {
            method: method.into(),
            target: None,
            args,
        }
    }

    pub fn and(self, other: Expr) -> Self {
        Self::binary(BinaryOp::And, self, other)
    }

    pub fn or(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Or, self, other)
    }

    pub fn negate(self) -> Self {
        Self::Not {
            operand: Box::new(self),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field { path } => write!(f, "x.{}", path),
            Self::Constant { value } => match value {
                Value::Text(s) => write!(f, "\"{}\"", s),
                Value::Null => f.write_str("null"),
                other => write!(f, "{}", other),
            },
            Self::Captured { name, .. } => f.write_str(name),
            Self::Member { target, member } => write!(f, "{}.{}", target, member),
            Self::Binary { op, left, right } => write!(f, "({} {} {})", left, op, right),
            Self::Not { operand } => write!(f, "!{}", operand),
            Self::Call {
                method,
                target,
                args,
            } => {
                let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                match target {
                    Some(t) => write!(f, "{}.{}({})", t, method, args.join(", ")),
                    None => write!(f, "{}({})", method, args.join(", ")),
                }
            }
        }
    }
}

impl ops::BitAnd for Expr {
    type Output = Expr;

    fn bitand(self, rhs: Expr) -> Expr {
        self.and(rhs)
    }
}

impl ops::BitOr for Expr {
    type Output = Expr;

    fn bitor(self, rhs: Expr) -> Expr {
        self.or(rhs)
    }
}

impl ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        self.negate()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Reference to a record field, the entry point of the builder
#[derive(Debug, Clone)]
pub struct FieldRef {
    path: String,
}

/// Start a predicate on a record field
pub fn field(path: impl Into<String>) -> FieldRef {
    FieldRef { path: path.into() }
}

impl FieldRef {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Descend one level into a referenced sub-record
    pub fn member(&self, name: &str) -> FieldRef {
        FieldRef {
            path: format!("{}.{}", self.path, name),
        }
    }

    pub fn expr(&self) -> Expr {
        Expr::Field {
            path: self.path.clone(),
        }
    }

    fn compare(&self, op: BinaryOp, value: Expr) -> Expr {
        Expr::binary(op, self.expr(), value)
    }

    pub fn eq(&self, value: impl Into<Value>) -> Expr {
        self.compare(BinaryOp::Eq, Expr::constant(value))
    }

    pub fn ne(&self, value: impl Into<Value>) -> Expr {
        self.compare(BinaryOp::Ne, Expr::constant(value))
    }

    pub fn lt(&self, value: impl Into<Value>) -> Expr {
        self.compare(BinaryOp::Lt, Expr::constant(value))
    }

    pub fn lte(&self, value: impl Into<Value>) -> Expr {
        self.compare(BinaryOp::Lte, Expr::constant(value))
    }

    pub fn gt(&self, value: impl Into<Value>) -> Expr {
        self.compare(BinaryOp::Gt, Expr::constant(value))
    }

    pub fn gte(&self, value: impl Into<Value>) -> Expr {
        self.compare(BinaryOp::Gte, Expr::constant(value))
    }

    /// Compare against an arbitrary value expression (e.g. a captured member)
    pub fn compare_to(&self, op: BinaryOp, value: Expr) -> Expr {
        self.compare(op, value)
    }

    pub fn is_null(&self) -> Expr {
        self.eq(Value::Null)
    }

    pub fn is_not_null(&self) -> Expr {
        self.ne(Value::Null)
    }

    /// Bare boolean field read
    pub fn is_true(&self) -> Expr {
        self.expr()
    }

    /// Negated boolean field read
    pub fn is_false(&self) -> Expr {
        self.expr().negate()
    }

    pub fn starts_with(&self, value: impl Into<Value>) -> Expr {
        Expr::call("StartsWith", self.expr(), vec![Expr::constant(value)])
    }

    pub fn ends_with(&self, value: impl Into<Value>) -> Expr {
        Expr::call("EndsWith", self.expr(), vec![Expr::constant(value)])
    }

    /// Substring match
    pub fn contains(&self, value: impl Into<Value>) -> Expr {
        Expr::call("Contains", self.expr(), vec![Expr::constant(value)])
    }

    /// Membership in a literal list
    pub fn is_in<I, V>(&self, values: I) -> Expr
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let list = Value::List(values.into_iter().map(Into::into).collect());
        Expr::call("Contains", Expr::constant(list), vec![self.expr()])
    }

    /// Membership in a collection held by a captured object
    pub fn is_in_captured(&self, collection: Expr) -> Expr {
        Expr::call("Contains", collection, vec![self.expr()])
    }
}

/// Builder for a captured host object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Captured {
    name: String,
    members: BTreeMap<String, Value>,
}

/// Start a captured object with the given display name
pub fn captured(name: impl Into<String>) -> Captured {
    Captured {
        name: name.into(),
        members: BTreeMap::new(),
    }
}

impl Captured {
    pub fn with(mut self, member: impl Into<String>, value: impl Into<Value>) -> Self {
        self.members.insert(member.into(), value.into());
        self
    }

    pub fn expr(&self) -> Expr {
        Expr::Captured {
            name: self.name.clone(),
            members: self.members.clone(),
        }
    }

    /// Access one member of the captured object
    pub fn member(&self, name: impl Into<String>) -> Expr {
        Expr::member(self.expr(), name)
    }
}

pub fn and(left: Expr, right: Expr) -> Expr {
    left.and(right)
}

pub fn or(left: Expr, right: Expr) -> Expr {
    left.or(right)
}

pub fn not(operand: Expr) -> Expr {
    operand.negate()
}
