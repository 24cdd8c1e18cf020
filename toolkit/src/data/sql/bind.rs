//! Positional parameter binding
//!
//! Rewrites `@name` references in assembled SQL into the placeholders of a
//! dialect, producing the values in the order the driver binds them. List
//! values expand to one placeholder per element so `Id IN @Id_p0` becomes
//! `Id IN (?, ?, ?)`.

use serde::Serialize;

use crate::data::error::StatementError;
use crate::data::predicate::{Parameter, Value};
use crate::utils::sql::is_identifier_char;

use super::SqlDialect;

/// SQL with positional placeholders and values in bind order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionalStatement {
    pub sql: String,
    pub values: Vec<Value>,
}

/// Rewrite named parameters into dialect placeholders
///
/// References are resolved in textual order; quoted literals are copied
/// verbatim. A name with no matching parameter fails with `UnknownParameter`.
pub fn bind_positional(
    sql: &str,
    parameters: &[Parameter],
    dialect: &dyn SqlDialect,
) -> Result<PositionalStatement, StatementError> {
    let mut out = String::with_capacity(sql.len());
    let mut values = Vec::new();
    let mut in_literal = false;
    let mut chars = sql.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c == '\'' {
            in_literal = !in_literal;
        }
        if c != '@' || in_literal {
            out.push(c);
            continue;
        }

        let mut end = start + 1;
        while let Some(&(i, next)) = chars.peek() {
            if !is_identifier_char(next) {
                break;
            }
            end = i + next.len_utf8();
            chars.next();
        }
        let name = &sql[start + 1..end];
        if name.is_empty() {
            out.push(c);
            continue;
        }

        let parameter = parameters
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| StatementError::UnknownParameter(name.to_string()))?;

        match &parameter.value {
            Value::List(items) if items.is_empty() => out.push_str(dialect.empty_list()),
            Value::List(items) => {
                let placeholders: Vec<String> = items
                    .iter()
                    .map(|item| {
                        values.push(item.clone());
                        dialect.placeholder(values.len())
                    })
                    .collect();
                out.push('(');
                out.push_str(&placeholders.join(", "));
                out.push(')');
            }
            value => {
                values.push(value.clone());
                out.push_str(&dialect.placeholder(values.len()));
            }
        }
    }

    tracing::trace!(
        dialect = dialect.name(),
        values = values.len(),
        "Bound statement positionally"
    );

    Ok(PositionalStatement { sql: out, values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sql::{PostgresDialect, SqlServerDialect, SqliteDialect};

    #[test]
    fn test_scalar_parameters() {
        let params = vec![Parameter::new("A_p0", 1), Parameter::new("B_p1", "x")];
        let bound = bind_positional("A = @A_p0 AND B = @B_p1", &params, &PostgresDialect).unwrap();
        assert_eq!(bound.sql, "A = $1 AND B = $2");
        assert_eq!(bound.values, vec![Value::Int(1), Value::from("x")]);
    }

    #[test]
    fn test_textual_order_and_reuse() {
        let params = vec![Parameter::new("Id", 7), Parameter::new("Name", "n")];
        let bound = bind_positional(
            "UPDATE T SET Name = @Name WHERE Id = @Id OR Id = @Id",
            &params,
            &SqliteDialect,
        )
        .unwrap();
        assert_eq!(bound.sql, "UPDATE T SET Name = ? WHERE Id = ? OR Id = ?");
        assert_eq!(
            bound.values,
            vec![Value::from("n"), Value::Int(7), Value::Int(7)]
        );
    }

    #[test]
    fn test_list_expansion() {
        let params = vec![
            Parameter::new("Id_p0", vec![1, 2, 3]),
            Parameter::new("Age_p1", 30),
        ];
        let bound = bind_positional(
            "Id IN @Id_p0 AND Age > @Age_p1",
            &params,
            &SqlServerDialect,
        )
        .unwrap();
        assert_eq!(bound.sql, "Id IN (@p1, @p2, @p3) AND Age > @p4");
        assert_eq!(bound.values.len(), 4);
    }

    #[test]
    fn test_empty_list() {
        let params = vec![Parameter::new("Id_p0", Vec::<i64>::new())];
        let bound = bind_positional("Id NOT IN @Id_p0", &params, &PostgresDialect).unwrap();
        assert_eq!(bound.sql, "Id NOT IN (SELECT NULL WHERE 1 = 0)");
        assert!(bound.values.is_empty());
    }

    #[test]
    fn test_literals_untouched() {
        let params = vec![Parameter::new("Name_p0", "a%")];
        let bound = bind_positional(
            "Name LIKE @Name_p0 ESCAPE '\\' AND Mail != 'x@y'",
            &params,
            &SqliteDialect,
        )
        .unwrap();
        assert_eq!(bound.sql, "Name LIKE ? ESCAPE '\\' AND Mail != 'x@y'");
    }

    #[test]
    fn test_unknown_parameter() {
        let err = bind_positional("A = @Missing", &[], &SqliteDialect).unwrap_err();
        assert!(matches!(err, StatementError::UnknownParameter(ref n) if n == "Missing"));
        assert_eq!(err.to_string(), "Unknown parameter @Missing");
    }
}
