//! SQL dialect trait for multi-database support
//!
//! Statements are assembled with named `@name` parameters. A dialect supplies
//! the pieces that differ per database when those statements are bound
//! positionally or limited to one row.

/// SQL dialect trait for generating database-specific SQL
///
/// Different databases have different syntax for:
/// - Parameter placeholders (`?` vs `$1` vs `@p1`)
/// - Restricting a query to its first row (`LIMIT 1` vs `TOP 1`)
pub trait SqlDialect: Send + Sync {
    /// Get the dialect name
    fn name(&self) -> &'static str;

    /// Generate a parameter placeholder for the given index (1-based)
    ///
    /// - SQLite: Always returns "?"
    /// - PostgreSQL: Returns "$1", "$2", etc.
    /// - SQL Server: Returns "@p1", "@p2", etc.
    fn placeholder(&self, index: usize) -> String;

    /// Restrict a `SELECT` statement to its first row
    ///
    /// - SQLite/PostgreSQL: `SELECT ... LIMIT 1`
    /// - SQL Server: `SELECT TOP 1 ...`
    fn first_row(&self, select_sql: &str) -> String {
        format!("{} LIMIT 1", select_sql)
    }

    /// Expression standing in for an empty `IN` list
    ///
    /// `IN ()` is a syntax error on every supported database, so an empty
    /// membership list binds to a subquery yielding no rows.
    fn empty_list(&self) -> &'static str {
        "(SELECT NULL WHERE 1 = 0)"
    }
}
