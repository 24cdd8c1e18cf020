//! Entity schemas
//!
//! Declarative description of how a record type maps to a table: the table
//! name, its columns in order and which operations each column takes part in.
//! A schema is registered once per record type and consumed by the statement
//! builder and the compiler's field validation.

mod registry;

pub use registry::SchemaRegistry;

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// One column of an entity table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    #[serde(default)]
    pub is_key: bool,
    #[serde(default = "default_true")]
    pub include_in_select: bool,
    #[serde(default = "default_true")]
    pub include_in_insert: bool,
    #[serde(default = "default_true")]
    pub include_in_update: bool,
    /// Column joins the key columns in the WHERE clause of `update`
    #[serde(default)]
    pub include_in_where: bool,
}

impl ColumnSchema {
    /// Regular value column
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_key: false,
            include_in_select: true,
            include_in_insert: true,
            include_in_update: true,
            include_in_where: false,
        }
    }

    /// Key column; generated by the database, so not inserted
    pub fn key(name: impl Into<String>) -> Self {
        Self {
            is_key: true,
            include_in_insert: false,
            ..Self::new(name)
        }
    }

    /// Column that is never read, written or matched
    pub fn ignored(name: impl Into<String>) -> Self {
        Self {
            include_in_select: false,
            include_in_insert: false,
            include_in_update: false,
            ..Self::new(name)
        }
    }

    pub fn insertable(mut self, include: bool) -> Self {
        self.include_in_insert = include;
        self
    }

    pub fn updatable(mut self, include: bool) -> Self {
        self.include_in_update = include;
        self
    }

    pub fn selectable(mut self, include: bool) -> Self {
        self.include_in_select = include;
        self
    }

    pub fn in_where(mut self, include: bool) -> Self {
        self.include_in_where = include;
        self
    }
}

/// Table mapping of one record type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub table_name: String,
    pub columns: Vec<ColumnSchema>,
    /// Flag column set to 1 by `soft_delete`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soft_delete_column: Option<String>,
}

impl EntitySchema {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
            soft_delete_column: None,
        }
    }

    pub fn column(mut self, column: ColumnSchema) -> Self {
        self.columns.push(column);
        self
    }

    pub fn soft_delete(mut self, column: impl Into<String>) -> Self {
        self.soft_delete_column = Some(column.into());
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Look up a column by name
    pub fn get_column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.get_column(name).is_some()
    }

    pub fn select_columns(&self) -> Vec<&ColumnSchema> {
        self.columns.iter().filter(|c| c.include_in_select).collect()
    }

    pub fn insert_columns(&self) -> Vec<&ColumnSchema> {
        self.columns.iter().filter(|c| c.include_in_insert).collect()
    }

    /// Columns written by `update`; key and where columns are matched, never set
    pub fn update_columns(&self) -> Vec<&ColumnSchema> {
        self.columns
            .iter()
            .filter(|c| c.include_in_update && !c.is_key && !c.include_in_where)
            .collect()
    }

    pub fn key_columns(&self) -> Vec<&ColumnSchema> {
        self.columns.iter().filter(|c| c.is_key).collect()
    }

    /// Columns matched by the WHERE clause of `update` and `soft_delete`
    pub fn where_columns(&self) -> Vec<&ColumnSchema> {
        self.columns
            .iter()
            .filter(|c| c.is_key || c.include_in_where)
            .collect()
    }
}

/// A record type with a registered table mapping
///
/// Rows are read through `serde::Serialize`, so the serialized field names
/// must match the column names.
///
/// ```
/// use std::sync::LazyLock;
///
/// use predsql::data::schema::{ColumnSchema, Entity, EntitySchema};
///
/// #[derive(serde::Serialize)]
/// struct User {
///     id: i64,
///     name: String,
/// }
///
/// static USER_SCHEMA: LazyLock<EntitySchema> = LazyLock::new(|| {
///     EntitySchema::new("Users")
///         .column(ColumnSchema::key("id"))
///         .column(ColumnSchema::new("name"))
/// });
///
/// impl Entity for User {
///     fn schema() -> &'static EntitySchema {
///         &USER_SCHEMA
///     }
/// }
///
/// assert_eq!(User::schema().key_columns().len(), 1);
/// ```
pub trait Entity: Serialize {
    fn schema() -> &'static EntitySchema;
}
