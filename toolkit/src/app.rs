//! Core application

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::cli::{self, CliConfig, Commands, StatementKind};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::data::predicate::{Expr, PredicateCompiler};
use crate::data::schema::{EntitySchema, SchemaRegistry};
use crate::data::statement::{Statement, StatementBuilder};
use crate::utils::file::read_input;

pub struct CoreApp {
    pub config: AppConfig,
    pub schemas: SchemaRegistry,
}

/// Entity summary printed by `predsql schemas`
#[derive(Debug, Serialize)]
struct SchemaSummary<'a> {
    entity: &'a str,
    table: &'a str,
    columns: Vec<&'a str>,
    keys: Vec<&'a str>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self::init(&cli_config)?;
        let output = app.execute(command)?;
        println!("{}", output);
        Ok(())
    }

    fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        Ok(Self::new(config))
    }

    pub fn new(config: AppConfig) -> Self {
        let schemas = config.registry();
        Self { config, schemas }
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        // stdout carries command output
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    /// Run one command, returning its pretty-printed JSON output
    pub fn execute(&self, command: Commands) -> Result<String> {
        match command {
            Commands::Compile {
                input,
                entity,
                positional,
            } => self.compile(&input, entity.as_deref(), positional),
            Commands::Statement {
                kind,
                entity,
                predicate,
                order_by,
                desc,
                positional,
            } => {
                let statement =
                    self.statement(kind, &entity, predicate.as_deref(), &order_by, desc)?;
                self.emit_statement(&statement, positional)
            }
            Commands::Schemas => self.list_schemas(),
        }
    }

    fn compile(&self, input: &Path, entity: Option<&str>, positional: bool) -> Result<String> {
        let predicate = read_predicate(input)?;

        let mut compiler = PredicateCompiler::new(self.config.compiler);
        if let Some(entity) = entity {
            compiler = compiler.with_schema(self.schema(entity)?);
        }

        let query = compiler.compile(&predicate)?;
        self.emit_statement(&Statement::new(query.sql, query.parameters), positional)
    }

    fn statement(
        &self,
        kind: StatementKind,
        entity: &str,
        predicate: Option<&Path>,
        order_by: &[String],
        desc: bool,
    ) -> Result<Statement> {
        let builder = StatementBuilder::with_options(
            self.schema(entity)?,
            self.config.dialect,
            self.config.compiler,
        );
        let predicate = predicate.map(read_predicate).transpose()?;

        let statement = match (kind, predicate.as_ref()) {
            (StatementKind::Select, None) => builder.select_all()?,
            (StatementKind::Select, Some(predicate)) => builder.find_all(predicate)?,
            (StatementKind::Find, Some(predicate)) => builder.find(predicate)?,
            (StatementKind::Delete, Some(predicate)) => builder.delete_where(predicate)?,
            (StatementKind::First, predicate) => {
                let order: Vec<&str> = order_by.iter().map(String::as_str).collect();
                builder.find_first_by_order(&order, predicate, desc)?
            }
            (StatementKind::Find | StatementKind::Delete, None) => {
                anyhow::bail!("'{:?}' needs a predicate (--predicate)", kind)
            }
        };
        Ok(statement)
    }

    fn emit_statement(&self, statement: &Statement, positional: bool) -> Result<String> {
        let json = if positional {
            let bound = statement.to_positional(self.config.dialect.dialect())?;
            serde_json::to_string_pretty(&bound)?
        } else {
            serde_json::to_string_pretty(statement)?
        };
        Ok(json)
    }

    fn list_schemas(&self) -> Result<String> {
        let names = self.schemas.names();
        let schemas: Vec<Arc<EntitySchema>> = names
            .iter()
            .filter_map(|name| self.schemas.get(name))
            .collect();

        let summaries: Vec<SchemaSummary<'_>> = names
            .iter()
            .zip(&schemas)
            .map(|(name, schema)| SchemaSummary {
                entity: name,
                table: &schema.table_name,
                columns: schema.columns.iter().map(|c| c.name.as_str()).collect(),
                keys: schema
                    .key_columns()
                    .into_iter()
                    .map(|c| c.name.as_str())
                    .collect(),
            })
            .collect();

        Ok(serde_json::to_string_pretty(&summaries)?)
    }

    fn schema(&self, entity: &str) -> Result<Arc<EntitySchema>> {
        self.schemas.get(entity).with_context(|| {
            format!(
                "Unknown entity '{}' (configured: {})",
                entity,
                self.schemas.names().join(", ")
            )
        })
    }
}

fn read_predicate(path: &Path) -> Result<Expr> {
    let content = read_input(path)?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse predicate: {}", path.display()))
}
