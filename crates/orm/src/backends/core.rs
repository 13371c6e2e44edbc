//! Core Database Backend Traits
//!
//! These traits hide the sqlx driver behind object-safe interfaces so the
//! migrator, the seeder manager and the schema introspector work the same way
//! against MySQL and SQLite.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::error::{OrmError, OrmResult};

/// Abstract database connection trait
#[async_trait]
pub trait DatabaseConnection: Send {
    /// Execute a statement and return affected rows count
    async fn execute(&mut self, sql: &str, params: &[DatabaseValue]) -> OrmResult<u64>;

    /// Execute a query and return the result rows
    async fn fetch_all(&mut self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Vec<Box<dyn DatabaseRow>>>;

    /// Execute a query and return the first result row
    async fn fetch_optional(&mut self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Option<Box<dyn DatabaseRow>>>;

    /// SQL dialect spoken by this connection
    fn dialect(&self) -> SqlDialect;
}

/// Abstract database transaction trait
#[async_trait]
pub trait DatabaseTransaction: DatabaseConnection {
    /// Commit the transaction
    async fn commit(self: Box<Self>) -> OrmResult<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> OrmResult<()>;

    /// Borrow the transaction as a plain connection for migration and seeder code
    fn as_connection(&mut self) -> &mut dyn DatabaseConnection;
}

/// Abstract database connection pool trait
#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Acquire a connection from the pool
    async fn acquire(&self) -> OrmResult<Box<dyn DatabaseConnection>>;

    /// Begin a transaction from the pool
    async fn begin_transaction(&self) -> OrmResult<Box<dyn DatabaseTransaction>>;

    /// Execute a statement directly on the pool
    async fn execute(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<u64>;

    /// Execute a query and return result rows directly on the pool
    async fn fetch_all(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Vec<Box<dyn DatabaseRow>>>;

    /// Execute a query and return the first result row directly on the pool
    async fn fetch_optional(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Option<Box<dyn DatabaseRow>>>;

    /// Close the pool
    async fn close(&self) -> OrmResult<()>;

    /// Get pool statistics
    fn stats(&self) -> DatabasePoolStats;

    /// Perform a health check on the pool
    async fn health_check(&self) -> OrmResult<Duration>;

    /// SQL dialect of the pooled connections
    fn dialect(&self) -> SqlDialect;
}

/// Database pool statistics
#[derive(Debug, Clone)]
pub struct DatabasePoolStats {
    pub total_connections: u32,
    pub idle_connections: u32,
    pub active_connections: u32,
}

/// Abstract database row trait
pub trait DatabaseRow: Send + Sync {
    /// Get a column value by index
    fn get_by_index(&self, index: usize) -> OrmResult<DatabaseValue>;

    /// Get a column value by name
    fn get_by_name(&self, name: &str) -> OrmResult<DatabaseValue>;

    /// Get column count
    fn column_count(&self) -> usize;

    /// Get column names
    fn column_names(&self) -> Vec<String>;
}

/// Typed accessors over [`DatabaseRow`]
pub trait DatabaseRowExt {
    /// Column as text. NULL is an error.
    fn get_string(&self, column: &str) -> OrmResult<String>;

    /// Column as text, NULL as `None`
    fn get_optional_string(&self, column: &str) -> OrmResult<Option<String>>;

    fn get_i64(&self, column: &str) -> OrmResult<i64>;

    fn get_optional_datetime(&self, column: &str) -> OrmResult<Option<DateTime<Utc>>>;

    /// First column as text, used for single-column listings such as `SHOW TABLES`
    fn first_string(&self) -> OrmResult<String>;
}

impl<R: DatabaseRow + ?Sized> DatabaseRowExt for R {
    fn get_string(&self, column: &str) -> OrmResult<String> {
        self.get_optional_string(column)?
            .ok_or_else(|| OrmError::Query(format!("Column '{}' is NULL", column)))
    }

    fn get_optional_string(&self, column: &str) -> OrmResult<Option<String>> {
        Ok(self.get_by_name(column)?.into_string())
    }

    fn get_i64(&self, column: &str) -> OrmResult<i64> {
        let value = self.get_by_name(column)?;
        value
            .as_i64()
            .ok_or_else(|| OrmError::Query(format!("Column '{}' is not an integer: {:?}", column, value)))
    }

    fn get_optional_datetime(&self, column: &str) -> OrmResult<Option<DateTime<Utc>>> {
        let value = self.get_by_name(column)?;
        if value.is_null() {
            return Ok(None);
        }
        value
            .as_datetime()
            .map(Some)
            .ok_or_else(|| OrmError::Query(format!("Column '{}' is not a timestamp: {:?}", column, value)))
    }

    fn first_string(&self) -> OrmResult<String> {
        self.get_by_index(0)?
            .into_string()
            .ok_or_else(|| OrmError::Query("First column is NULL".to_string()))
    }
}

/// Database value enumeration for type-safe parameter binding
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseValue {
    Null,
    Bool(bool),
    Int64(i64),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
    DateTime(DateTime<Utc>),
}

impl DatabaseValue {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, DatabaseValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DatabaseValue::Int64(i) => Some(*i),
            DatabaseValue::Bool(b) => Some(i64::from(*b)),
            DatabaseValue::Float64(f) if f.fract() == 0.0 => Some(*f as i64),
            DatabaseValue::String(s) => s.trim().parse().ok(),
            DatabaseValue::Bytes(b) => std::str::from_utf8(b).ok()?.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DatabaseValue::String(s) => Some(s),
            DatabaseValue::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// Render any non-null value as text. Binary catalog columns are decoded lossily.
    pub fn into_string(self) -> Option<String> {
        match self {
            DatabaseValue::Null => None,
            DatabaseValue::Bool(b) => Some(b.to_string()),
            DatabaseValue::Int64(i) => Some(i.to_string()),
            DatabaseValue::Float64(f) => Some(f.to_string()),
            DatabaseValue::String(s) => Some(s),
            DatabaseValue::Bytes(b) => Some(String::from_utf8_lossy(&b).into_owned()),
            DatabaseValue::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }

    /// Interpret the value as a UTC timestamp. SQLite stores timestamps as text.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            DatabaseValue::DateTime(dt) => Some(*dt),
            DatabaseValue::String(s) => parse_timestamp(s),
            DatabaseValue::Bytes(b) => parse_timestamp(std::str::from_utf8(b).ok()?),
            DatabaseValue::Int64(secs) => Utc.timestamp_opt(*secs, 0).single(),
            _ => None,
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

impl From<bool> for DatabaseValue {
    fn from(value: bool) -> Self {
        DatabaseValue::Bool(value)
    }
}

impl From<i32> for DatabaseValue {
    fn from(value: i32) -> Self {
        DatabaseValue::Int64(i64::from(value))
    }
}

impl From<i64> for DatabaseValue {
    fn from(value: i64) -> Self {
        DatabaseValue::Int64(value)
    }
}

impl From<f64> for DatabaseValue {
    fn from(value: f64) -> Self {
        DatabaseValue::Float64(value)
    }
}

impl From<String> for DatabaseValue {
    fn from(value: String) -> Self {
        DatabaseValue::String(value)
    }
}

impl From<&str> for DatabaseValue {
    fn from(value: &str) -> Self {
        DatabaseValue::String(value.to_string())
    }
}

impl From<&String> for DatabaseValue {
    fn from(value: &String) -> Self {
        DatabaseValue::String(value.clone())
    }
}

impl From<Vec<u8>> for DatabaseValue {
    fn from(value: Vec<u8>) -> Self {
        DatabaseValue::Bytes(value)
    }
}

impl From<DateTime<Utc>> for DatabaseValue {
    fn from(value: DateTime<Utc>) -> Self {
        DatabaseValue::DateTime(value)
    }
}

impl<T> From<Option<T>> for DatabaseValue
where
    T: Into<DatabaseValue>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => DatabaseValue::Null,
        }
    }
}

/// SQL dialect enumeration for generating database-specific SQL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    MySQL,
    SQLite,
}

impl SqlDialect {
    /// Get the parameter placeholder style for this dialect
    pub fn parameter_placeholder(&self, _index: usize) -> &'static str {
        "?"
    }

    /// Quote an identifier
    pub fn quote_identifier(&self, name: &str) -> String {
        match self {
            SqlDialect::MySQL => format!("`{}`", name.replace('`', "``")),
            SqlDialect::SQLite => format!("\"{}\"", name.replace('"', "\"\"")),
        }
    }

    /// Get the current timestamp function for this dialect
    pub fn current_timestamp(&self) -> &'static str {
        "CURRENT_TIMESTAMP"
    }

    /// Get the auto-increment keyword for this dialect
    pub fn auto_increment(&self) -> &'static str {
        match self {
            SqlDialect::MySQL => "AUTO_INCREMENT",
            SqlDialect::SQLite => "AUTOINCREMENT",
        }
    }

    /// Integer surrogate primary key column named `id`
    pub fn id_column(&self) -> &'static str {
        match self {
            SqlDialect::MySQL => "id INT PRIMARY KEY AUTO_INCREMENT",
            SqlDialect::SQLite => "id INTEGER PRIMARY KEY AUTOINCREMENT",
        }
    }

    /// `created_at` / `updated_at` column pair
    pub fn timestamp_columns(&self) -> &'static str {
        "created_at DATETIME DEFAULT CURRENT_TIMESTAMP, updated_at DATETIME DEFAULT CURRENT_TIMESTAMP"
    }

    /// Query returning one row per table, table name in the first column
    pub fn list_tables_sql(&self) -> &'static str {
        match self {
            SqlDialect::MySQL => "SHOW TABLES",
            SqlDialect::SQLite => {
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
            }
        }
    }

    pub fn disable_foreign_keys_sql(&self) -> &'static str {
        match self {
            SqlDialect::MySQL => "SET FOREIGN_KEY_CHECKS = 0",
            SqlDialect::SQLite => "PRAGMA foreign_keys = OFF",
        }
    }

    pub fn enable_foreign_keys_sql(&self) -> &'static str {
        match self {
            SqlDialect::MySQL => "SET FOREIGN_KEY_CHECKS = 1",
            SqlDialect::SQLite => "PRAGMA foreign_keys = ON",
        }
    }

    pub fn drop_table_sql(&self, table: &str) -> String {
        format!("DROP TABLE IF EXISTS {}", self.quote_identifier(table))
    }

    /// DDL of the migration ledger
    pub fn create_migrations_table_sql(&self, table: &str) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    \
                {},\n    \
                migration VARCHAR(255) NOT NULL UNIQUE,\n    \
                batch INTEGER NOT NULL,\n    \
                executed_at DATETIME DEFAULT CURRENT_TIMESTAMP\n\
            )",
            table,
            self.id_column()
        )
    }

    /// DDL of the seeder audit table
    pub fn create_seeders_table_sql(&self, table: &str) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    \
                {},\n    \
                name VARCHAR(255) NOT NULL UNIQUE,\n    \
                executed_at TIMESTAMP NULL DEFAULT CURRENT_TIMESTAMP,\n    \
                rollback_at TIMESTAMP NULL\n\
            )",
            table,
            self.id_column()
        )
    }
}

impl std::fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlDialect::MySQL => write!(f, "mysql"),
            SqlDialect::SQLite => write!(f, "sqlite"),
        }
    }
}

/// Database backend trait that provides database-specific implementations
#[async_trait]
pub trait DatabaseBackend: Send + Sync {
    /// Create a connection pool from a database URL
    async fn create_pool(&self, database_url: &str, config: DatabasePoolConfig) -> OrmResult<Arc<dyn DatabasePool>>;

    /// Get the SQL dialect used by this backend
    fn sql_dialect(&self) -> SqlDialect;

    /// Validate a database URL for this backend
    fn validate_database_url(&self, url: &str) -> OrmResult<()>;
}

/// Database pool configuration
#[derive(Debug, Clone)]
pub struct DatabasePoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub idle_timeout_seconds: Option<u64>,
    pub max_lifetime_seconds: Option<u64>,
    pub test_before_acquire: bool,
}

impl Default for DatabasePoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 5,
            min_connections: 1,
            acquire_timeout_seconds: 30,
            idle_timeout_seconds: Some(600),
            max_lifetime_seconds: Some(1800),
            test_before_acquire: true,
        }
    }
}

impl DatabasePoolConfig {
    /// One connection that is never recycled. Required for in-memory SQLite,
    /// where every new connection opens an empty database.
    pub fn single_connection() -> Self {
        Self {
            max_connections: 1,
            min_connections: 1,
            acquire_timeout_seconds: 5,
            idle_timeout_seconds: None,
            max_lifetime_seconds: None,
            test_before_acquire: false,
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self.min_connections = self.min_connections.min(self.max_connections);
        self
    }
}
