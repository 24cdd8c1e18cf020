//! SQL abstraction layer for multi-database support
//!
//! This module provides abstractions for turning assembled statements into
//! SQL that binds on a specific backend (SQLite, PostgreSQL, SQL Server).

mod bind;
mod dialect;
mod postgres_dialect;
mod sqlite_dialect;
mod sqlserver_dialect;

pub use bind::{PositionalStatement, bind_positional};
pub use dialect::SqlDialect;
pub use postgres_dialect::PostgresDialect;
pub use sqlite_dialect::SqliteDialect;
pub use sqlserver_dialect::SqlServerDialect;

use serde::{Deserialize, Serialize};

/// Database backend identifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Sqlite,
    Postgres,
    /// Native home of `@name` parameters
    #[default]
    SqlServer,
}

impl Backend {
    /// Get the SQL dialect for this backend
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Backend::Sqlite => &SqliteDialect,
            Backend::Postgres => &PostgresDialect,
            Backend::SqlServer => &SqlServerDialect,
        }
    }

    /// Get the backend name
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Sqlite => "sqlite",
            Backend::Postgres => "postgres",
            Backend::SqlServer => "sqlserver",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(Backend::Sqlite),
            "postgres" | "postgresql" => Ok(Backend::Postgres),
            "sqlserver" | "mssql" => Ok(Backend::SqlServer),
            other => Err(format!(
                "Unknown dialect '{}' (expected sqlite, postgres or sqlserver)",
                other
            )),
        }
    }
}
