//! Statement assembly
//!
//! Wraps compiled WHERE text in full SELECT / INSERT / UPDATE / DELETE
//! statements for one entity schema. Statements carry named `@name`
//! parameters; `Statement::to_positional` rewrites them for a driver that
//! binds by position.

mod builder;
mod row;

pub use builder::StatementBuilder;

use serde::Serialize;

use super::error::StatementError;
use super::predicate::{Parameter, Value};
use super::sql::{PositionalStatement, SqlDialect, bind_positional};

/// Assembled SQL statement with named parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub sql: String,
    pub parameters: Vec<Parameter>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, parameters: Vec<Parameter>) -> Self {
        Self {
            sql: sql.into(),
            parameters,
        }
    }

    /// Look up a bound value by parameter name (without the `@`)
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    /// Rewrite named parameters into the placeholders of `dialect`
    pub fn to_positional(
        &self,
        dialect: &dyn SqlDialect,
    ) -> Result<PositionalStatement, StatementError> {
        bind_positional(&self.sql, &self.parameters, dialect)
    }
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sql::{PostgresDialect, SqliteDialect};

    #[test]
    fn test_to_positional() {
        let stmt = Statement::new(
            "SELECT Id FROM Users WHERE Id IN @Id_in AND Name = @Name_p0",
            vec![
                Parameter::new("Id_in", vec![1, 2]),
                Parameter::new("Name_p0", "a"),
            ],
        );
        let bound = stmt.to_positional(&PostgresDialect).unwrap();
        assert_eq!(
            bound.sql,
            "SELECT Id FROM Users WHERE Id IN ($1, $2) AND Name = $3"
        );
        assert_eq!(
            bound.values,
            vec![Value::Int(1), Value::Int(2), Value::from("a")]
        );
    }

    #[test]
    fn test_parameter_lookup_and_display() {
        let stmt = Statement::new("DELETE FROM T WHERE Id = @Id", vec![Parameter::new("Id", 3)]);
        assert_eq!(stmt.parameter("Id"), Some(&Value::Int(3)));
        assert_eq!(stmt.parameter("Name"), None);
        assert_eq!(stmt.to_string(), "DELETE FROM T WHERE Id = @Id");
        assert!(stmt.to_positional(&SqliteDialect).is_ok());
    }
}
