//! SQL Server dialect implementation

use super::SqlDialect;

/// SQL Server (T-SQL) dialect
pub struct SqlServerDialect;

impl SqlDialect for SqlServerDialect {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("@p{}", index)
    }

    fn first_row(&self, select_sql: &str) -> String {
        match select_sql.strip_prefix("SELECT ") {
            Some(rest) => format!("SELECT TOP 1 {}", rest),
            None => format!("SELECT TOP 1 * FROM ({}) AS first_row", select_sql),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder() {
        let dialect = SqlServerDialect;
        assert_eq!(dialect.placeholder(1), "@p1");
        assert_eq!(dialect.placeholder(12), "@p12");
    }

    #[test]
    fn test_first_row() {
        let dialect = SqlServerDialect;
        assert_eq!(
            dialect.first_row("SELECT Id, Name FROM Users ORDER BY Id DESC"),
            "SELECT TOP 1 Id, Name FROM Users ORDER BY Id DESC"
        );
    }
}
