use clap::{Parser, Subcommand};

use std::path::PathBuf;

use crate::data::sql::Backend;

use super::constants::{ENV_CONFIG, ENV_DIALECT, ENV_ESCAPE_LIKE, STDIN_PATH};

#[derive(Parser)]
#[command(name = "predsql")]
#[command(version, about = "Compile boolean predicates into parameterized SQL", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// SQL dialect (sqlite, postgres or sqlserver)
    #[arg(long, short = 'd', global = true, env = ENV_DIALECT, value_parser = parse_backend)]
    pub dialect: Option<Backend>,

    /// Escape LIKE wildcards in string-match values
    #[arg(long, global = true, env = ENV_ESCAPE_LIKE)]
    pub escape_like: bool,
}

/// Parse SQL dialect from CLI/env string
fn parse_backend(s: &str) -> Result<Backend, String> {
    s.parse()
}

/// Parse statement kind from CLI string
fn parse_statement_kind(s: &str) -> Result<StatementKind, String> {
    match s.to_lowercase().as_str() {
        "select" => Ok(StatementKind::Select),
        "find" => Ok(StatementKind::Find),
        "first" => Ok(StatementKind::First),
        "delete" => Ok(StatementKind::Delete),
        _ => Err(format!(
            "Invalid statement '{}'. Valid options: select, find, first, delete",
            s
        )),
    }
}

/// Statement shapes the CLI can assemble
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// All rows, optionally filtered
    Select,
    /// Rows matching a predicate
    Find,
    /// First row in a given order
    First,
    /// Delete rows matching a predicate
    Delete,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Compile a predicate (JSON) into WHERE text and parameters
    Compile {
        /// Predicate file, or - for stdin
        #[arg(default_value = STDIN_PATH)]
        input: PathBuf,

        /// Validate fields against this entity's schema
        #[arg(long, short)]
        entity: Option<String>,

        /// Rewrite named parameters into dialect placeholders
        #[arg(long)]
        positional: bool,
    },
    /// Assemble a full statement for a configured entity
    Statement {
        /// Statement to build (select, find, first, delete)
        #[arg(value_parser = parse_statement_kind)]
        kind: StatementKind,

        /// Entity name from the config's schemas section
        #[arg(long, short)]
        entity: String,

        /// Predicate file, or - for stdin
        #[arg(long, short)]
        predicate: Option<PathBuf>,

        /// Order columns for `first` (repeatable)
        #[arg(long = "order-by", short = 'o')]
        order_by: Vec<String>,

        /// Descending order for `first`
        #[arg(long)]
        desc: bool,

        /// Rewrite named parameters into dialect placeholders
        #[arg(long)]
        positional: bool,
    },
    /// List configured entity schemas
    Schemas,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub dialect: Option<Backend>,
    pub escape_like: bool,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    let cli = Cli::parse();
    let config = CliConfig {
        config: cli.config,
        dialect: cli.dialect,
        escape_like: cli.escape_like,
    };
    (config, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_statement_kind() {
        assert_eq!(parse_statement_kind("FIRST").unwrap(), StatementKind::First);
        assert!(parse_statement_kind("upsert").is_err());
    }

    #[test]
    fn test_parse_compile_command() {
        let cli = Cli::try_parse_from([
            "predsql",
            "--dialect",
            "postgres",
            "compile",
            "filter.json",
            "--entity",
            "user",
        ])
        .unwrap();
        assert_eq!(cli.dialect, Some(Backend::Postgres));
        match cli.command {
            Commands::Compile {
                input,
                entity,
                positional,
            } => {
                assert_eq!(input, PathBuf::from("filter.json"));
                assert_eq!(entity.as_deref(), Some("user"));
                assert!(!positional);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_statement_command() {
        let cli = Cli::try_parse_from([
            "predsql", "statement", "first", "-e", "user", "-o", "Age", "-o", "Id", "--desc",
        ])
        .unwrap();
        match cli.command {
            Commands::Statement {
                kind,
                order_by,
                desc,
                predicate,
                ..
            } => {
                assert_eq!(kind, StatementKind::First);
                assert_eq!(order_by, vec!["Age", "Id"]);
                assert!(desc);
                assert!(predicate.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_dialect_rejected() {
        let result = Cli::try_parse_from(["predsql", "--dialect", "oracle", "schemas"]);
        assert!(result.is_err());
    }
}
