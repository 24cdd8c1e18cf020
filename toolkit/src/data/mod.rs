//! Data layer
//!
//! Predicate compilation, entity schemas, statement assembly and SQL
//! dialects. Nothing here opens a connection; statements are handed to
//! whatever driver the caller uses.

pub mod error;
pub mod predicate;
pub mod schema;
pub mod sql;
pub mod statement;

pub use error::{CompileError, StatementError};
pub use predicate::{CompileOptions, Expr, PredicateCompiler, RenderedQuery, compile, field};
pub use schema::{ColumnSchema, Entity, EntitySchema, SchemaRegistry};
pub use sql::Backend;
pub use statement::{Statement, StatementBuilder};
