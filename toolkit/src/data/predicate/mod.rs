//! Predicate compiler
//!
//! Translates a boolean expression tree over one record into parameterized
//! SQL WHERE text:
//!
//! ```text
//! Expr ──parse──> PredicateNode (IR) ──validate──> ──render──> RenderedQuery
//! ```
//!
//! Compilation is pure. Each call owns its IR and parameter counter, so a
//! single compiler can be shared across threads without locking.

pub mod expr;
pub mod extract;
pub mod ir;
pub mod operators;
pub mod parser;
pub mod render;
pub mod value;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::CompileError;
use super::schema::EntitySchema;

pub use expr::{BinaryOp, Captured, Expr, FieldRef, and, captured, field, not, or};
pub use ir::{Group, Leaf, PredicateNode};
pub use operators::LogicalOp;
pub use render::{Parameter, RenderedQuery};
pub use value::Value;

/// Compiler settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Escape `%`, `_` and `\` in string-match values and add `ESCAPE '\'`
    pub escape_like_wildcards: bool,
    /// Reject fields the attached schema does not declare
    pub validate_fields: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            escape_like_wildcards: false,
            validate_fields: true,
        }
    }
}

/// Predicate compiler with optional schema validation
#[derive(Debug, Clone, Default)]
pub struct PredicateCompiler {
    options: CompileOptions,
    schema: Option<Arc<EntitySchema>>,
}

impl PredicateCompiler {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            options,
            schema: None,
        }
    }

    /// Attach the schema of the record type predicates are written against
    pub fn with_schema(mut self, schema: Arc<EntitySchema>) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn schema(&self) -> Option<&EntitySchema> {
        self.schema.as_deref()
    }

    /// Parse and validate without rendering
    pub fn parse(&self, expr: &Expr) -> Result<PredicateNode, CompileError> {
        let node = parser::parse(expr, self.options.escape_like_wildcards)?;
        self.validate(&node)?;
        tracing::trace!(ir = ?node, "Parsed predicate");
        Ok(node)
    }

    /// Compile a predicate into WHERE text and its parameters
    pub fn compile(&self, expr: &Expr) -> Result<RenderedQuery, CompileError> {
        let node = self.parse(expr)?;
        let query = render::render(&node, self.options.escape_like_wildcards);
        tracing::debug!(
            sql = %query.sql,
            parameters = query.parameters.len(),
            "Compiled predicate"
        );
        Ok(query)
    }

    fn validate(&self, node: &PredicateNode) -> Result<(), CompileError> {
        let Some(schema) = self.schema.as_deref() else {
            return Ok(());
        };
        if !self.options.validate_fields {
            return Ok(());
        }
        match node
            .leaves()
            .into_iter()
            .find(|leaf| !leaf.nested && !schema.has_column(&leaf.field))
        {
            Some(leaf) => Err(CompileError::unknown_field(
                leaf.field.as_str(),
                schema.table_name(),
            )),
            None => Ok(()),
        }
    }
}

/// Compile with default options and no schema
pub fn compile(expr: &Expr) -> Result<RenderedQuery, CompileError> {
    PredicateCompiler::default().compile(expr)
}

/// Field names a predicate references, in discovery order without repeats
pub fn field_names(expr: &Expr) -> Result<Vec<String>, CompileError> {
    let node = parser::parse(expr, false)?;
    let mut names: Vec<String> = Vec::new();
    for leaf in node.leaves() {
        if !names.contains(&leaf.field) {
            names.push(leaf.field.clone());
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::ColumnSchema;

    #[test]
    fn test_single_comparison() {
        let query = compile(&field("Field").eq("v")).unwrap();
        assert_eq!(query.sql, "Field = @Field_p0");
        assert_eq!(query.parameters, vec![Parameter::new("Field_p0", "v")]);
    }

    #[test]
    fn test_null_comparison() {
        let query = compile(&field("Field").is_null()).unwrap();
        assert_eq!(query.sql, "Field IS NULL");
        assert!(query.parameters.is_empty());

        let query = compile(&field("Field").is_not_null()).unwrap();
        assert_eq!(query.sql, "Field IS NOT NULL");
    }

    #[test]
    fn test_flat_and_chain() {
        let e = field("A").eq(1) & field("B").eq(2) & field("C").eq(3);
        let query = compile(&e).unwrap();
        assert_eq!(query.sql, "A = @A_p0 AND B = @B_p1 AND C = @C_p2");
        let names: Vec<&str> = query.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A_p0", "B_p1", "C_p2"]);
    }

    #[test]
    fn test_right_nested_chain_is_flat() {
        let e = field("A").eq(1) & (field("B").eq(2) & field("C").eq(3));
        assert_eq!(
            compile(&e).unwrap().sql,
            "A = @A_p0 AND B = @B_p1 AND C = @C_p2"
        );
    }

    #[test]
    fn test_or_of_and_groups() {
        let e = (field("A").eq(1) & field("B").eq(2)) | (field("C").eq(3) & field("D").eq(4));
        assert_eq!(
            compile(&e).unwrap().sql,
            "(A = @A_p0 AND B = @B_p1) OR (C = @C_p2 AND D = @D_p3)"
        );
    }

    #[test]
    fn test_mixed_run_keeps_parens() {
        let e = (field("A").eq(1) & field("B").eq(2)) & (field("C").eq(3) | field("D").eq(4));
        assert_eq!(
            compile(&e).unwrap().sql,
            "A = @A_p0 AND B = @B_p1 AND (C = @C_p2 OR D = @D_p3)"
        );

        let e = field("A").eq(1) | (field("B").eq(2) & field("C").eq(3));
        assert_eq!(
            compile(&e).unwrap().sql,
            "A = @A_p0 OR (B = @B_p1 AND C = @C_p2)"
        );

        let e = (field("A").eq(1) | field("B").eq(2)) & field("C").eq(3);
        assert_eq!(
            compile(&e).unwrap().sql,
            "(A = @A_p0 OR B = @B_p1) AND C = @C_p2"
        );
    }

    #[test]
    fn test_repeated_field_no_collision() {
        let e = field("Age").gt(10) & field("Age").lt(20);
        let query = compile(&e).unwrap();
        assert_eq!(query.sql, "Age > @Age_p0 AND Age < @Age_p1");
        assert_eq!(query.parameter("Age_p0"), Some(&Value::Int(10)));
        assert_eq!(query.parameter("Age_p1"), Some(&Value::Int(20)));
    }

    #[test]
    fn test_string_match() {
        let query = compile(&field("Field").starts_with("ab")).unwrap();
        assert_eq!(query.sql, "Field LIKE @Field_p0");
        assert_eq!(query.parameter("Field_p0"), Some(&Value::from("ab%")));

        let query = compile(&!field("Field").starts_with("ab")).unwrap();
        assert_eq!(query.sql, "Field NOT LIKE @Field_p0");
    }

    #[test]
    fn test_membership() {
        let filter = captured("filter").with("Ids", vec![3, 5]);
        let e = field("Id").is_in_captured(filter.member("Ids")) & !field("Code").is_in(["x"]);
        let query = compile(&e).unwrap();
        assert_eq!(query.sql, "Id IN @Id_p0 AND Code NOT IN @Code_p1");
        assert_eq!(query.parameter("Id_p0"), Some(&Value::from(vec![3, 5])));
    }

    #[test]
    fn test_bool_fields() {
        let e = field("IsActive").is_true() & field("IsLocked").is_false();
        let query = compile(&e).unwrap();
        assert_eq!(query.sql, "IsActive = @IsActive_p0 AND IsLocked = @IsLocked_p1");
        assert_eq!(query.parameter("IsLocked_p1"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_captured_value() {
        let filter = captured("filter").with("MinAge", 18);
        let e = field("Age").compare_to(BinaryOp::Gte, filter.member("MinAge"));
        let query = compile(&e).unwrap();
        assert_eq!(query.sql, "Age >= @Age_p0");
        assert_eq!(query.parameter("Age_p0"), Some(&Value::Int(18)));
    }

    #[test]
    fn test_nested_path() {
        let query = compile(&field("Address").member("City").eq("Oslo")).unwrap();
        assert_eq!(query.sql, "AddressCity = @AddressCity_p0");
    }

    #[test]
    fn test_deep_nesting_fails_without_output() {
        let e = field("A").eq(1) & field("A.B.C").eq(2);
        assert_eq!(compile(&e).unwrap_err(), CompileError::nesting("A.B.C"));
    }

    #[test]
    fn test_idempotent() {
        let e = (field("A").eq(1) | field("B").starts_with("x")) & field("C").is_null();
        let first = compile(&e).unwrap();
        let second = compile(&e).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.sql, "(A = @A_p0 OR B LIKE @B_p1) AND C IS NULL");
    }

    #[test]
    fn test_escape_like_wildcards() {
        let compiler = PredicateCompiler::new(CompileOptions {
            escape_like_wildcards: true,
            ..CompileOptions::default()
        });
        let query = compiler.compile(&field("Code").contains("10%_")).unwrap();
        assert_eq!(query.sql, "Code LIKE @Code_p0 ESCAPE '\\'");
        assert_eq!(query.parameter("Code_p0"), Some(&Value::from("%10\\%\\_%")));
    }

    #[test]
    fn test_schema_validation() {
        let schema = Arc::new(
            EntitySchema::new("Users")
                .column(ColumnSchema::key("Id"))
                .column(ColumnSchema::new("Name")),
        );
        let compiler = PredicateCompiler::default().with_schema(schema.clone());

        assert!(compiler.compile(&field("Name").eq("a")).is_ok());
        assert!(compiler.compile(&field("Address").member("City").eq("a")).is_ok());
        assert_eq!(
            compiler.compile(&field("Nickname").eq("a")).unwrap_err(),
            CompileError::unknown_field("Nickname", "Users")
        );

        let lenient = PredicateCompiler::new(CompileOptions {
            validate_fields: false,
            ..CompileOptions::default()
        })
        .with_schema(schema);
        assert!(lenient.compile(&field("Nickname").eq("a")).is_ok());
    }

    #[test]
    fn test_field_names() {
        let e = field("Age").gt(1) & field("Name").eq("a") & field("Age").lt(9);
        assert_eq!(field_names(&e).unwrap(), vec!["Age", "Name"]);
    }

    #[test]
    fn test_concurrent_compilation() {
        let compiler = PredicateCompiler::default();
        let e = field("A").eq(1) & field("B").eq(2);
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| compiler.compile(&e).unwrap().sql))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), "A = @A_p0 AND B = @B_p1");
            }
        });
    }

    #[test]
    fn test_options_deserialize_defaults() {
        let options: CompileOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, CompileOptions::default());
        let options: CompileOptions =
            serde_json::from_str(r#"{"escape_like_wildcards": true}"#).unwrap();
        assert!(options.escape_like_wildcards && options.validate_fields);
    }
}
