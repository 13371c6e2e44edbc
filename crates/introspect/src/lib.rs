//! # strata-introspect
//!
//! Reads tables, columns, indexes and foreign keys from a live MySQL or
//! SQLite database and orders tables so referenced ones come first.

pub mod ddl;
pub mod error;
pub mod inspector;
pub mod model;
mod mysql;
pub mod ordering;
mod sqlite;

pub use ddl::{parse_create_table, parse_foreign_key_line};
pub use error::{IntrospectError, IntrospectResult};
pub use inspector::SchemaInspector;
pub use model::{ColumnInfo, ColumnKey, ForeignKeyInfo, IndexInfo, ReferentialAction, TableInfo};
pub use ordering::order_by_dependency;
