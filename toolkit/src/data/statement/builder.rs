//! Statement builder for one entity schema

use std::sync::Arc;

use serde::Serialize;

use crate::data::error::{CompileError, StatementError};
use crate::data::predicate::render::render;
use crate::data::predicate::{
    CompileOptions, Expr, LogicalOp, Parameter, PredicateCompiler, PredicateNode, RenderedQuery,
    Value,
};
use crate::data::schema::{ColumnSchema, Entity, EntitySchema};
use crate::data::sql::{Backend, SqlDialect};

use super::Statement;
use super::row::Row;

/// Assembles statements against one table
///
/// Holds the schema, the target dialect and a compiler bound to the schema,
/// so every predicate is validated against the table's columns.
pub struct StatementBuilder {
    schema: Arc<EntitySchema>,
    dialect: &'static dyn SqlDialect,
    compiler: PredicateCompiler,
}

impl StatementBuilder {
    pub fn new(schema: Arc<EntitySchema>, backend: Backend) -> Self {
        Self::with_options(schema, backend, CompileOptions::default())
    }

    pub fn with_options(
        schema: Arc<EntitySchema>,
        backend: Backend,
        options: CompileOptions,
    ) -> Self {
        let compiler = PredicateCompiler::new(options).with_schema(schema.clone());
        Self {
            schema,
            dialect: backend.dialect(),
            compiler,
        }
    }

    /// Builder for a record type with a registered mapping
    pub fn for_entity<E: Entity>(backend: Backend) -> Self {
        Self::new(Arc::new(E::schema().clone()), backend)
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    pub fn dialect(&self) -> &'static dyn SqlDialect {
        self.dialect
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// `SELECT <columns> FROM <table>`
    pub fn select_all(&self) -> Result<Statement, StatementError> {
        let sql = self.select_prefix(self.table(), &self.select_names()?);
        Ok(self.finish("select_all", sql, Vec::new()))
    }

    /// Rows matching a predicate; the caller reads the first one
    pub fn find(&self, predicate: &Expr) -> Result<Statement, StatementError> {
        self.select_where("find", self.table(), &self.select_names()?, predicate)
    }

    /// All rows matching a predicate
    pub fn find_all(&self, predicate: &Expr) -> Result<Statement, StatementError> {
        self.select_where("find_all", self.table(), &self.select_names()?, predicate)
    }

    /// Like `find_all`, reading from another table or view with the same columns
    pub fn find_all_from(
        &self,
        table: &str,
        predicate: &Expr,
    ) -> Result<Statement, StatementError> {
        self.select_where("find_all_from", table, &self.select_names()?, predicate)
    }

    /// Like `find_all`, reading only the named columns
    pub fn find_all_with_columns(
        &self,
        columns: &[&str],
        predicate: &Expr,
    ) -> Result<Statement, StatementError> {
        let names = self.checked_names(columns, "select")?;
        self.select_where("find_all_with_columns", self.table(), &names, predicate)
    }

    /// Rows whose `field` is in `values`, optionally narrowed by a predicate
    ///
    /// The list binds as one parameter named `<field>_in`.
    pub fn find_all_in(
        &self,
        field: &str,
        values: Vec<Value>,
        predicate: Option<&Expr>,
        columns: Option<&[&str]>,
    ) -> Result<Statement, StatementError> {
        self.require_column(field)?;
        let names = match columns {
            Some(columns) => self.checked_names(columns, "select")?,
            None => self.select_names()?,
        };

        let param = format!("{}_in", field);
        let mut sql = format!(
            "{} WHERE {} IN @{}",
            self.select_prefix(self.table(), &names),
            field,
            param
        );
        let mut parameters = vec![Parameter::new(param, Value::List(values))];

        if let Some(predicate) = predicate {
            let (query, has_or) = self.compile_where(predicate)?;
            if has_or {
                sql.push_str(&format!(" AND ({})", query.sql));
            } else {
                sql.push_str(&format!(" AND {}", query.sql));
            }
            parameters.extend(query.parameters);
        }

        Ok(self.finish("find_all_in", sql, parameters))
    }

    /// First row in `order_columns` order, optionally filtered
    pub fn find_first_by_order(
        &self,
        order_columns: &[&str],
        predicate: Option<&Expr>,
        desc: bool,
    ) -> Result<Statement, StatementError> {
        let order = self.checked_names(order_columns, "order by")?;
        let mut sql = self.select_prefix(self.table(), &self.select_names()?);
        let mut parameters = Vec::new();

        if let Some(predicate) = predicate {
            let (query, _) = self.compile_where(predicate)?;
            sql.push_str(&format!(" WHERE {}", query.sql));
            parameters = query.parameters;
        }

        sql.push_str(&format!(" ORDER BY {}", order.join(", ")));
        if desc {
            sql.push_str(" DESC");
        }

        let sql = self.dialect.first_row(&sql);
        Ok(self.finish("find_first_by_order", sql, parameters))
    }

    /// Row by its single key column
    pub fn get_by_id(&self, id: impl Into<Value>) -> Result<Statement, StatementError> {
        let key = self.single_key()?;
        let sql = format!(
            "{} WHERE {} = @{}",
            self.select_prefix(self.table(), &self.select_names()?),
            key.name,
            key.name
        );
        let parameters = vec![Parameter::new(key.name.as_str(), id)];
        Ok(self.finish("get_by_id", sql, parameters))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// `INSERT INTO <table> (<columns>) VALUES (@<columns>)`
    pub fn insert<E: Serialize>(&self, row: &E) -> Result<Statement, StatementError> {
        let columns = self.schema.insert_columns();
        if columns.is_empty() {
            return Err(StatementError::no_columns(self.table(), "insert"));
        }
        let row = Row::read(self.table(), row)?;

        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        let placeholders: Vec<String> = names.iter().map(|n| format!("@{}", n)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table(),
            names.join(", "),
            placeholders.join(", ")
        );
        let parameters = bind_row(&row, &columns)?;
        Ok(self.finish("insert", sql, parameters))
    }

    /// One `insert` per row, in order
    pub fn insert_all<E: Serialize>(
        &self,
        rows: &[E],
    ) -> Result<Vec<Statement>, StatementError> {
        rows.iter().map(|row| self.insert(row)).collect()
    }

    /// Update every updatable column of a row, matched by key and where-columns
    pub fn update<E: Serialize>(&self, row: &E) -> Result<Statement, StatementError> {
        let set = self.schema.update_columns();
        if set.is_empty() {
            return Err(StatementError::no_columns(self.table(), "update"));
        }
        let matched = self.schema.where_columns();
        if matched.is_empty() {
            return Err(StatementError::missing_key(self.table()));
        }
        let row = Row::read(self.table(), row)?;

        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            self.table(),
            assignments(&set).join(", "),
            assignments(&matched).join(" AND ")
        );
        let mut parameters = bind_row(&row, &set)?;
        parameters.extend(bind_row(&row, &matched)?);
        Ok(self.finish("update", sql, parameters))
    }

    /// Set a few columns on every row matching a predicate
    pub fn update_columns(
        &self,
        values: &[(&str, Value)],
        predicate: &Expr,
    ) -> Result<Statement, StatementError> {
        if values.is_empty() {
            return Err(StatementError::no_columns(self.table(), "update"));
        }
        let mut set = Vec::with_capacity(values.len());
        let mut parameters = Vec::with_capacity(values.len());
        for (column, value) in values {
            self.require_column(column)?;
            set.push(format!("{} = @{}", column, column));
            parameters.push(Parameter::new(*column, value.clone()));
        }

        let (query, _) = self.compile_where(predicate)?;
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            self.table(),
            set.join(", "),
            query.sql
        );
        parameters.extend(query.parameters);
        Ok(self.finish("update_columns", sql, parameters))
    }

    /// Delete a row by its key columns
    pub fn delete<E: Serialize>(&self, row: &E) -> Result<Statement, StatementError> {
        let keys = self.schema.key_columns();
        if keys.is_empty() {
            return Err(StatementError::missing_key(self.table()));
        }
        let row = Row::read(self.table(), row)?;

        let sql = format!(
            "DELETE FROM {} WHERE {}",
            self.table(),
            assignments(&keys).join(" AND ")
        );
        let parameters = bind_row(&row, &keys)?;
        Ok(self.finish("delete", sql, parameters))
    }

    /// Delete every row matching a predicate
    pub fn delete_where(&self, predicate: &Expr) -> Result<Statement, StatementError> {
        let (query, _) = self.compile_where(predicate)?;
        let sql = format!("DELETE FROM {} WHERE {}", self.table(), query.sql);
        Ok(self.finish("delete_where", sql, query.parameters))
    }

    /// Flag a row deleted, matched by its key and where columns
    pub fn soft_delete<E: Serialize>(&self, row: &E) -> Result<Statement, StatementError> {
        let Some(flag) = self.schema.soft_delete_column.as_deref() else {
            return Err(StatementError::SoftDeleteUnsupported {
                table: self.table().to_string(),
            });
        };
        let matched = self.schema.where_columns();
        if matched.is_empty() {
            return Err(StatementError::missing_key(self.table()));
        }
        let row = Row::read(self.table(), row)?;

        let sql = format!(
            "UPDATE {} SET {} = 1 WHERE {}",
            self.table(),
            flag,
            assignments(&matched).join(" AND ")
        );
        let parameters = bind_row(&row, &matched)?;
        Ok(self.finish("soft_delete", sql, parameters))
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn table(&self) -> &str {
        &self.schema.table_name
    }

    fn select_prefix(&self, table: &str, columns: &[&str]) -> String {
        format!("SELECT {} FROM {}", columns.join(", "), table)
    }

    fn select_names(&self) -> Result<Vec<&str>, StatementError> {
        let names: Vec<&str> = self
            .schema
            .select_columns()
            .into_iter()
            .map(|c| c.name.as_str())
            .collect();
        if names.is_empty() {
            return Err(StatementError::no_columns(self.table(), "select"));
        }
        Ok(names)
    }

    fn checked_names<'a>(
        &self,
        columns: &[&'a str],
        operation: &'static str,
    ) -> Result<Vec<&'a str>, StatementError> {
        if columns.is_empty() {
            return Err(StatementError::no_columns(self.table(), operation));
        }
        for column in columns {
            self.require_column(column)?;
        }
        Ok(columns.to_vec())
    }

    fn require_column(&self, column: &str) -> Result<(), StatementError> {
        if self.schema.has_column(column) {
            Ok(())
        } else {
            Err(StatementError::unknown_column(column, self.table()))
        }
    }

    fn single_key(&self) -> Result<&ColumnSchema, StatementError> {
        let keys = self.schema.key_columns();
        match keys.as_slice() {
            [] => Err(StatementError::missing_key(self.table())),
            [key] => Ok(*key),
            keys => Err(StatementError::CompositeKey {
                table: self.table().to_string(),
                count: keys.len(),
            }),
        }
    }

    /// Compile a WHERE predicate, reporting whether its top level joins with OR
    fn compile_where(&self, predicate: &Expr) -> Result<(RenderedQuery, bool), CompileError> {
        let node = self.compiler.parse(predicate)?;
        let has_or = match &node {
            PredicateNode::Group(group) => group
                .children
                .iter()
                .any(|c| c.link() == Some(LogicalOp::Or)),
            PredicateNode::Leaf(_) => false,
        };
        let query = render(&node, self.compiler.options().escape_like_wildcards);
        Ok((query, has_or))
    }

    fn select_where(
        &self,
        operation: &'static str,
        table: &str,
        columns: &[&str],
        predicate: &Expr,
    ) -> Result<Statement, StatementError> {
        let (query, _) = self.compile_where(predicate)?;
        let sql = format!("{} WHERE {}", self.select_prefix(table, columns), query.sql);
        Ok(self.finish(operation, sql, query.parameters))
    }

    fn finish(
        &self,
        operation: &'static str,
        sql: String,
        parameters: Vec<Parameter>,
    ) -> Statement {
        tracing::debug!(
            table = %self.schema.table_name,
            operation,
            sql = %sql,
            parameters = parameters.len(),
            "Assembled statement"
        );
        Statement::new(sql, parameters)
    }
}

fn assignments(columns: &[&ColumnSchema]) -> Vec<String> {
    columns
        .iter()
        .map(|c| format!("{} = @{}", c.name, c.name))
        .collect()
}

fn bind_row(row: &Row, columns: &[&ColumnSchema]) -> Result<Vec<Parameter>, StatementError> {
    columns
        .iter()
        .map(|c| Ok(Parameter::new(c.name.as_str(), row.value(&c.name)?)))
        .collect()
}
