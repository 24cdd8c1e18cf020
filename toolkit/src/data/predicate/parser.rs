//! Predicate parsing
//!
//! Single pass over an `Expr`, producing the IR. Four input classes:
//! comparisons, string-match / membership calls, logical `And`/`Or`, and bare
//! boolean field reads (normalized to `= true` / `= false`).
//!
//! Logical combinations are flattened within runs of the same operator so
//! `a AND b AND c` never renders as `a AND (b AND c)`, while mixed runs keep
//! their parentheses.

use crate::data::error::CompileError;
use crate::utils::sql::is_identifier;

use super::expr::{BinaryOp, Expr};
use super::extract::{extract_collection, extract_value};
use super::ir::{Group, Leaf, PredicateNode};
use super::operators::{LogicalOp, Method, like_pattern, method_operator, sql_operator};
use super::value::Value;

/// Resolved field reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    /// Name used in SQL text and as the parameter stem
    pub name: String,
    /// True when the path goes one level into a referenced sub-record
    pub nested: bool,
}

/// Parse a predicate into its IR
pub fn parse(expr: &Expr, escape_like: bool) -> Result<PredicateNode, CompileError> {
    Parser { escape_like }.parse_node(expr, None)
}

/// Resolve a field read into its SQL name
///
/// Paths have at most two segments; a nested path renders as its
/// concatenated segment names (`Address.City` -> `AddressCity`).
pub fn resolve_field_path(expr: &Expr) -> Result<FieldPath, CompileError> {
    let segments = field_segments(expr)
        .ok_or_else(|| CompileError::expression(format!("{} is not a record field", expr)))?;

    let path = segments.join(".");
    if !segments.iter().all(|s| is_identifier(s)) {
        return Err(CompileError::expression(format!(
            "invalid field path '{}'",
            path
        )));
    }
    if segments.len() > 2 {
        return Err(CompileError::nesting(path));
    }

    Ok(FieldPath {
        name: segments.concat(),
        nested: segments.len() == 2,
    })
}

fn field_segments(expr: &Expr) -> Option<Vec<String>> {
    match expr {
        Expr::Field { path } => Some(path.split('.').map(str::to_string).collect()),
        Expr::Member { target, member } => {
            let mut segments = field_segments(target)?;
            segments.push(member.clone());
            Some(segments)
        }
        _ => None,
    }
}

fn is_field_expr(expr: &Expr) -> bool {
    field_segments(expr).is_some()
}

struct Parser {
    escape_like: bool,
}

impl Parser {
    fn parse_node(
        &self,
        expr: &Expr,
        link: Option<LogicalOp>,
    ) -> Result<PredicateNode, CompileError> {
        match expr {
            Expr::Binary { op, left, right } => match LogicalOp::from_binary(*op) {
                Some(logical) => {
                    let left = self.parse_node(left, None)?;
                    let right = self.parse_node(right, Some(logical))?;
                    Ok(combine(left, right, logical).linked(link))
                }
                None => self.parse_comparison(*op, left, right, link),
            },
            Expr::Call { .. } => self.parse_call(expr, link, false),
            Expr::Not { operand } => match operand.as_ref() {
                Expr::Call { .. } => self.parse_call(operand, link, true),
                inner if is_field_expr(inner) => bool_read(inner, false, link),
                _ => Err(CompileError::expression(format!(
                    "{} (negation is only supported on method calls and boolean fields)",
                    expr
                ))),
            },
            Expr::Field { .. } | Expr::Member { .. } => bool_read(expr, true, link),
            Expr::Constant { .. } | Expr::Captured { .. } => Err(CompileError::expression(
                format!("{} is not a predicate", expr),
            )),
        }
    }

    fn parse_comparison(
        &self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        link: Option<LogicalOp>,
    ) -> Result<PredicateNode, CompileError> {
        let operator = sql_operator(Some(op))?;
        let field = resolve_field_path(left)?;
        let value = extract_value(right)?;

        if value.is_null() && !matches!(op, BinaryOp::Eq | BinaryOp::Ne) {
            return Err(CompileError::operator(format!(
                "'{}' cannot compare {} against null",
                op, left
            )));
        }
        if value.as_list().is_some() {
            return Err(CompileError::expression(format!(
                "{} {} {} compares against a collection; use a membership test",
                left, op, right
            )));
        }

        Ok(leaf(field, operator, value, link))
    }

    fn parse_call(
        &self,
        expr: &Expr,
        link: Option<LogicalOp>,
        negated: bool,
    ) -> Result<PredicateNode, CompileError> {
        let Expr::Call {
            method,
            target,
            args,
        } = expr
        else {
            return Err(CompileError::expression(format!(
                "{} is not a method call",
                expr
            )));
        };

        let mut kind = Method::from_name(method)?;
        let receiver = target.as_deref();

        if matches!(kind, Method::Contains | Method::Exists) && receiver.is_some_and(is_field_expr)
        {
            kind = Method::StringContains;
        }

        match kind {
            Method::StartsWith | Method::EndsWith | Method::StringContains => {
                let Some(receiver) = receiver.filter(|r| is_field_expr(r)) else {
                    return Err(CompileError::method(method.as_str()));
                };
                let field = resolve_field_path(receiver)?;
                let arg = args.first().ok_or_else(|| missing_argument(expr))?;
                let pattern = like_pattern(kind, &extract_value(arg)?, self.escape_like)?;
                Ok(leaf(
                    field,
                    method_operator(kind, negated),
                    Value::Text(pattern),
                    link,
                ))
            }
            Method::Contains | Method::Exists => {
                let (collection, member) = match receiver {
                    Some(collection) => (Some(collection), args.first()),
                    None => (args.first(), args.iter().rev().find(|a| is_field_expr(a))),
                };
                let (Some(collection), Some(member)) = (collection, member) else {
                    return Err(missing_argument(expr));
                };
                let field = resolve_field_path(member)?;
                let values = extract_collection(collection)?;
                Ok(leaf(
                    field,
                    method_operator(kind, negated),
                    Value::List(values),
                    link,
                ))
            }
            Method::Any | Method::All => Err(CompileError::method(method.as_str())),
        }
    }
}

fn bool_read(
    expr: &Expr,
    value: bool,
    link: Option<LogicalOp>,
) -> Result<PredicateNode, CompileError> {
    let field = resolve_field_path(expr)?;
    Ok(leaf(field, "=", Value::Bool(value), link))
}

fn leaf(
    field: FieldPath,
    operator: &'static str,
    value: Value,
    link: Option<LogicalOp>,
) -> PredicateNode {
    PredicateNode::Leaf(Leaf {
        link,
        field: field.name,
        operator,
        value,
        nested: field.nested,
    })
}

fn missing_argument(expr: &Expr) -> CompileError {
    CompileError::expression(format!("{} is missing an argument", expr))
}

/// Merge the parsed sides of `left op right`
///
/// `right` arrives already linked with `op`. Runs of the same operator are
/// spliced into one group; a group with a different operator is kept as a
/// single parenthesized child.
fn combine(left: PredicateNode, right: PredicateNode, op: LogicalOp) -> PredicateNode {
    match (left, right) {
        // (a AND b) AND c => (a AND b AND c)
        (PredicateNode::Group(mut l), PredicateNode::Leaf(r))
            if l.trailing_link() == Some(op) =>
        {
            l.children.push(PredicateNode::Leaf(r));
            PredicateNode::Group(l)
        }
        // (a AND b) AND (c AND d) => (a AND b AND c AND d)
        // (a AND b) AND (c OR d)  => (a AND b AND (c OR d))
        (PredicateNode::Group(mut l), PredicateNode::Group(r))
            if l.trailing_link() == Some(op) =>
        {
            if r.trailing_link() == Some(op) {
                l.children.extend(splice(r, op));
            } else {
                l.children.push(PredicateNode::Group(r));
            }
            PredicateNode::Group(l)
        }
        // a AND (b AND c) => (a AND b AND c)
        (l, PredicateNode::Group(r)) if r.trailing_link() == Some(op) => {
            let mut children = vec![l];
            children.extend(splice(r, op));
            PredicateNode::Group(Group {
                link: None,
                children,
            })
        }
        (l, r) => PredicateNode::Group(Group {
            link: None,
            children: vec![l, r],
        }),
    }
}

/// Children of a group about to be spliced after a sibling linked by `op`
fn splice(group: Group, op: LogicalOp) -> Vec<PredicateNode> {
    let mut children = group.children;
    if let Some(first) = children.first_mut() {
        first.set_link(Some(op));
    }
    children
}
