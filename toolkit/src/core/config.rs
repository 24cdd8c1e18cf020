use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::predicate::CompileOptions;
use crate::data::schema::{EntitySchema, SchemaRegistry};
use crate::data::sql::Backend;
use crate::utils::file::expand_path;
use crate::utils::sql::is_identifier;

use super::cli::CliConfig;
use super::constants::{APP_DOT_FOLDER, CONFIG_FILE_NAME};

// =============================================================================
// File Configuration
// =============================================================================

#[derive(Debug, Default, Clone, Deserialize)]
pub struct CompilerFileConfig {
    pub escape_like_wildcards: Option<bool>,
    pub validate_fields: Option<bool>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub compiler: Option<CompilerFileConfig>,
    pub dialect: Option<Backend>,
    pub schemas: Option<BTreeMap<String, EntitySchema>>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        // Compiler
        if let Some(compiler) = other.compiler {
            let current = self
                .compiler
                .get_or_insert_with(CompilerFileConfig::default);
            if compiler.escape_like_wildcards.is_some() {
                tracing::trace!(
                    escape = ?compiler.escape_like_wildcards,
                    "Merging compiler.escape_like_wildcards"
                );
                current.escape_like_wildcards = compiler.escape_like_wildcards;
            }
            if compiler.validate_fields.is_some() {
                tracing::trace!(
                    validate = ?compiler.validate_fields,
                    "Merging compiler.validate_fields"
                );
                current.validate_fields = compiler.validate_fields;
            }
        }

        // Dialect
        if other.dialect.is_some() {
            tracing::trace!(dialect = ?other.dialect, "Merging dialect");
            self.dialect = other.dialect;
        }

        // Schemas are replaced per entity, never merged column by column
        if let Some(schemas) = other.schemas {
            let current = self.schemas.get_or_insert_with(BTreeMap::new);
            for (name, schema) in schemas {
                tracing::trace!(entity = %name, "Merging schema");
                current.insert(name, schema);
            }
        }
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub compiler: CompileOptions,
    pub dialect: Backend,
    pub schemas: BTreeMap<String, EntitySchema>,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.predsql/predsql.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        Self::load_with_profile(cli, get_profile_config_path().as_deref())
    }

    fn load_with_profile(cli: &CliConfig, profile_path: Option<&Path>) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Load from profile dir - skip if not exists
        if let Some(profile_path) = profile_path
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. Load from CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        // 3. Layer configs: defaults -> file config -> CLI/env overrides
        let file_compiler = file_config.compiler.unwrap_or_default();
        let defaults = CompileOptions::default();

        // --escape-like can only switch escaping on
        let compiler = CompileOptions {
            escape_like_wildcards: cli.escape_like
                || file_compiler
                    .escape_like_wildcards
                    .unwrap_or(defaults.escape_like_wildcards),
            validate_fields: file_compiler
                .validate_fields
                .unwrap_or(defaults.validate_fields),
        };

        let dialect = cli.dialect.or(file_config.dialect).unwrap_or_default();

        let config = Self {
            compiler,
            dialect,
            schemas: file_config.schemas.unwrap_or_default(),
        };

        config.validate()?;

        tracing::debug!(
            dialect = %config.dialect,
            schemas = config.schemas.len(),
            escape_like = config.compiler.escape_like_wildcards,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Registry holding every configured schema
    pub fn registry(&self) -> SchemaRegistry {
        self.schemas
            .iter()
            .map(|(name, schema)| (name.clone(), schema.clone()))
            .collect()
    }

    fn validate(&self) -> Result<()> {
        for (name, schema) in &self.schemas {
            if !schema.table_name.split('.').all(is_identifier) {
                anyhow::bail!(
                    "Configuration error: schemas.{}.table_name '{}' is not a valid table name",
                    name,
                    schema.table_name
                );
            }
            if schema.columns.is_empty() {
                anyhow::bail!("Configuration error: schemas.{} has no columns", name);
            }

            let mut seen = HashSet::new();
            for column in &schema.columns {
                if !is_identifier(&column.name) {
                    anyhow::bail!(
                        "Configuration error: schemas.{} column '{}' is not a valid column name",
                        name,
                        column.name
                    );
                }
                if !seen.insert(column.name.as_str()) {
                    anyhow::bail!(
                        "Configuration error: schemas.{} declares column '{}' twice",
                        name,
                        column.name
                    );
                }
            }

            if let Some(flag) = &schema.soft_delete_column
                && !is_identifier(flag)
            {
                anyhow::bail!(
                    "Configuration error: schemas.{}.soft_delete_column '{}' is not a valid column name",
                    name,
                    flag
                );
            }
        }

        Ok(())
    }
}

/// Get the profile config path (~/.predsql/predsql.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    const USERS_CONFIG: &str = r#"{
        "dialect": "postgres",
        "compiler": { "escape_like_wildcards": true },
        "schemas": {
            "user": {
                "table_name": "Users",
                "columns": [
                    { "name": "Id", "is_key": true, "include_in_insert": false },
                    { "name": "Name" }
                ],
                "soft_delete_column": "Is_Delete"
            }
        }
    }"#;

    fn write_config(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn cli_with(path: PathBuf) -> CliConfig {
        CliConfig {
            config: Some(path),
            ..CliConfig::default()
        }
    }

    #[test]
    fn test_file_config_parse_full() {
        let config: FileConfig = serde_json::from_str(USERS_CONFIG).unwrap();
        assert_eq!(config.dialect, Some(Backend::Postgres));
        assert_eq!(
            config.compiler.as_ref().unwrap().escape_like_wildcards,
            Some(true)
        );
        let schemas = config.schemas.unwrap();
        assert_eq!(schemas["user"].table_name, "Users");
        assert_eq!(schemas["user"].key_columns().len(), 1);
    }

    #[test]
    fn test_file_config_unknown_fields_collected() {
        let config: FileConfig = serde_json::from_str(r#"{ "dialekt": "sqlite" }"#).unwrap();
        assert!(config.dialect.is_none());
        assert!(config.extra.get("dialekt").is_some());
    }

    #[test]
    fn test_merge_precedence() {
        let mut base: FileConfig = serde_json::from_str(USERS_CONFIG).unwrap();
        let overlay: FileConfig = serde_json::from_str(
            r#"{
                "dialect": "sqlite",
                "compiler": { "validate_fields": false },
                "schemas": { "order": { "table_name": "Orders", "columns": [{ "name": "Id" }] } }
            }"#,
        )
        .unwrap();
        base.merge(overlay);

        assert_eq!(base.dialect, Some(Backend::Sqlite));
        let compiler = base.compiler.unwrap();
        assert_eq!(compiler.escape_like_wildcards, Some(true));
        assert_eq!(compiler.validate_fields, Some(false));
        assert_eq!(base.schemas.unwrap().len(), 2);
    }

    #[test]
    fn test_load_layers() {
        let dir = tempfile::tempdir().unwrap();
        let profile = write_config(&dir, "profile.json", r#"{ "dialect": "sqlite" }"#);
        let overlay = write_config(&dir, "predsql.json", USERS_CONFIG);

        let config = AppConfig::load_with_profile(&cli_with(overlay.clone()), Some(&profile))
            .unwrap();
        assert_eq!(config.dialect, Backend::Postgres);
        assert!(config.compiler.escape_like_wildcards);
        assert!(config.compiler.validate_fields);

        let cli = CliConfig {
            dialect: Some(Backend::SqlServer),
            ..cli_with(overlay)
        };
        let config = AppConfig::load_with_profile(&cli, Some(&profile)).unwrap();
        assert_eq!(config.dialect, Backend::SqlServer);

        let registry = config.registry();
        assert_eq!(registry.names(), vec!["user"]);
    }

    #[test]
    fn test_load_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let empty = write_config(&dir, "empty.json", "{}");
        let config = AppConfig::load_with_profile(&cli_with(empty), None).unwrap();
        assert_eq!(config.dialect, Backend::SqlServer);
        assert_eq!(config.compiler, CompileOptions::default());
        assert!(config.schemas.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load_with_profile(&cli_with("/no/such/predsql.json".into()), None)
            .unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_load_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let broken = write_config(&dir, "broken.json", "{ not json");
        let err = AppConfig::load_with_profile(&cli_with(broken), None).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_validate_rejects_bad_schemas() {
        let cases = [
            r#"{ "schemas": { "x": { "table_name": "Bad Table", "columns": [{ "name": "Id" }] } } }"#,
            r#"{ "schemas": { "x": { "table_name": "T", "columns": [] } } }"#,
            r#"{ "schemas": { "x": { "table_name": "T", "columns": [{ "name": "Id" }, { "name": "Id" }] } } }"#,
            r#"{ "schemas": { "x": { "table_name": "T", "columns": [{ "name": "a;b" }] } } }"#,
        ];
        let dir = tempfile::tempdir().unwrap();
        for (i, case) in cases.iter().enumerate() {
            let path = write_config(&dir, &format!("case{}.json", i), case);
            let err = AppConfig::load_with_profile(&cli_with(path), None).unwrap_err();
            assert!(
                err.to_string().starts_with("Configuration error"),
                "case {}: {}",
                i,
                err
            );
        }
    }

    #[test]
    fn test_validate_accepts_schema_qualified_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "qualified.json",
            r#"{ "schemas": { "x": { "table_name": "dbo.Users", "columns": [{ "name": "Id" }] } } }"#,
        );
        assert!(AppConfig::load_with_profile(&cli_with(path), None).is_ok());
    }
}
