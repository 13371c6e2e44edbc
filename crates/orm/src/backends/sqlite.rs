//! SQLite Backend Implementation
//!
//! SQLite implementation of the database backend traits using sqlx. Used for
//! local development databases under `storage/` and in-memory test databases.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Executor, Pool, Row, TypeInfo, ValueRef};

use super::core::*;
use crate::error::{OrmError, OrmResult};

/// SQLite database backend implementation
#[derive(Debug, Default)]
pub struct SqliteBackend;

impl SqliteBackend {
    pub fn new() -> Self {
        Self
    }

    /// Filesystem path of a file-backed database URL, `None` for in-memory databases
    pub fn database_path(url: &str) -> Option<&str> {
        let rest = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))?;
        let path = rest.split('?').next().unwrap_or_default();
        if path.is_empty() || path.starts_with(":memory:") {
            None
        } else {
            Some(path)
        }
    }
}

#[async_trait]
impl DatabaseBackend for SqliteBackend {
    async fn create_pool(&self, database_url: &str, config: DatabasePoolConfig) -> OrmResult<Arc<dyn DatabasePool>> {
        self.validate_database_url(database_url)?;

        if let Some(parent) = Self::database_path(database_url).and_then(|p| Path::new(p).parent()) {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    OrmError::Connection(format!(
                        "Failed to create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections.min(config.max_connections))
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .test_before_acquire(config.test_before_acquire)
            .idle_timeout(config.idle_timeout_seconds.map(Duration::from_secs))
            .max_lifetime(config.max_lifetime_seconds.map(Duration::from_secs));

        let sqlx_pool = options
            .connect(database_url)
            .await
            .map_err(|e| OrmError::Connection(format!("Failed to create SQLite pool: {}", e)))?;

        Ok(Arc::new(SqliteDatabasePool::new(sqlx_pool)))
    }

    fn sql_dialect(&self) -> SqlDialect {
        SqlDialect::SQLite
    }

    fn validate_database_url(&self, url: &str) -> OrmResult<()> {
        if !url.starts_with("sqlite:") {
            return Err(OrmError::Connection("Invalid SQLite URL scheme".to_string()));
        }
        Ok(())
    }
}

/// SQLite connection pool implementation
pub struct SqliteDatabasePool {
    pool: Pool<Sqlite>,
}

impl SqliteDatabasePool {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DatabasePool for SqliteDatabasePool {
    async fn acquire(&self) -> OrmResult<Box<dyn DatabaseConnection>> {
        let conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| OrmError::Connection(format!("Failed to acquire connection: {}", e)))?;

        Ok(Box::new(SqliteDatabaseConnection { conn }))
    }

    async fn begin_transaction(&self) -> OrmResult<Box<dyn DatabaseTransaction>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| OrmError::Transaction(format!("Failed to begin transaction: {}", e)))?;

        Ok(Box::new(SqliteDatabaseTransaction { tx: Some(tx) }))
    }

    async fn execute(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<u64> {
        execute_with(&self.pool, sql, params).await
    }

    async fn fetch_all(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Vec<Box<dyn DatabaseRow>>> {
        fetch_all_with(&self.pool, sql, params).await
    }

    async fn fetch_optional(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Option<Box<dyn DatabaseRow>>> {
        fetch_optional_with(&self.pool, sql, params).await
    }

    async fn close(&self) -> OrmResult<()> {
        self.pool.close().await;
        Ok(())
    }

    fn stats(&self) -> DatabasePoolStats {
        let total = self.pool.size();
        let idle = self.pool.num_idle() as u32;

        DatabasePoolStats {
            total_connections: total,
            idle_connections: idle,
            active_connections: total.saturating_sub(idle),
        }
    }

    async fn health_check(&self) -> OrmResult<Duration> {
        let start = Instant::now();

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| OrmError::Connection(format!("Health check failed: {}", e)))?;

        Ok(start.elapsed())
    }

    fn dialect(&self) -> SqlDialect {
        SqlDialect::SQLite
    }
}

/// SQLite pooled connection implementation
pub struct SqliteDatabaseConnection {
    conn: sqlx::pool::PoolConnection<Sqlite>,
}

#[async_trait]
impl DatabaseConnection for SqliteDatabaseConnection {
    async fn execute(&mut self, sql: &str, params: &[DatabaseValue]) -> OrmResult<u64> {
        execute_with(&mut *self.conn, sql, params).await
    }

    async fn fetch_all(&mut self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Vec<Box<dyn DatabaseRow>>> {
        fetch_all_with(&mut *self.conn, sql, params).await
    }

    async fn fetch_optional(&mut self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Option<Box<dyn DatabaseRow>>> {
        fetch_optional_with(&mut *self.conn, sql, params).await
    }

    fn dialect(&self) -> SqlDialect {
        SqlDialect::SQLite
    }
}

/// SQLite transaction implementation
pub struct SqliteDatabaseTransaction {
    tx: Option<sqlx::Transaction<'static, Sqlite>>,
}

impl SqliteDatabaseTransaction {
    fn tx(&mut self) -> OrmResult<&mut sqlx::Transaction<'static, Sqlite>> {
        self.tx
            .as_mut()
            .ok_or_else(|| OrmError::Transaction("Transaction already completed".to_string()))
    }
}

#[async_trait]
impl DatabaseConnection for SqliteDatabaseTransaction {
    async fn execute(&mut self, sql: &str, params: &[DatabaseValue]) -> OrmResult<u64> {
        let tx = self.tx()?;
        execute_with(&mut **tx, sql, params).await
    }

    async fn fetch_all(&mut self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Vec<Box<dyn DatabaseRow>>> {
        let tx = self.tx()?;
        fetch_all_with(&mut **tx, sql, params).await
    }

    async fn fetch_optional(&mut self, sql: &str, params: &[DatabaseValue]) -> OrmResult<Option<Box<dyn DatabaseRow>>> {
        let tx = self.tx()?;
        fetch_optional_with(&mut **tx, sql, params).await
    }

    fn dialect(&self) -> SqlDialect {
        SqlDialect::SQLite
    }
}

#[async_trait]
impl DatabaseTransaction for SqliteDatabaseTransaction {
    async fn commit(mut self: Box<Self>) -> OrmResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| OrmError::Transaction("Transaction already completed".to_string()))?;

        tx.commit()
            .await
            .map_err(|e| OrmError::Transaction(format!("Transaction commit failed: {}", e)))
    }

    async fn rollback(mut self: Box<Self>) -> OrmResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| OrmError::Transaction("Transaction already completed".to_string()))?;

        tx.rollback()
            .await
            .map_err(|e| OrmError::Transaction(format!("Transaction rollback failed: {}", e)))
    }

    fn as_connection(&mut self) -> &mut dyn DatabaseConnection {
        self
    }
}

/// SQLite row implementation
pub struct SqliteDatabaseRow {
    row: SqliteRow,
}

impl DatabaseRow for SqliteDatabaseRow {
    fn get_by_index(&self, index: usize) -> OrmResult<DatabaseValue> {
        if index >= self.row.len() {
            return Err(OrmError::Query(format!("Column index {} out of range", index)));
        }
        sqlite_value_to_database_value(&self.row, index)
    }

    fn get_by_name(&self, name: &str) -> OrmResult<DatabaseValue> {
        let index = self
            .row
            .columns()
            .iter()
            .position(|col| col.name() == name)
            .ok_or_else(|| OrmError::Query(format!("Column '{}' not found", name)))?;

        sqlite_value_to_database_value(&self.row, index)
    }

    fn column_count(&self) -> usize {
        self.row.len()
    }

    fn column_names(&self) -> Vec<String> {
        self.row.columns().iter().map(|col| col.name().to_string()).collect()
    }
}

fn boxed_row(row: SqliteRow) -> Box<dyn DatabaseRow> {
    Box::new(SqliteDatabaseRow { row })
}

async fn execute_with<'e, E>(executor: E, sql: &'e str, params: &'e [DatabaseValue]) -> OrmResult<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = if params.is_empty() {
        executor.execute(sql).await
    } else {
        bind_params(sqlx::query(sql), params).execute(executor).await
    };

    result
        .map(|r| r.rows_affected())
        .map_err(|e| OrmError::Query(format!("Query execution failed: {}", e)))
}

async fn fetch_all_with<'e, E>(executor: E, sql: &'e str, params: &'e [DatabaseValue]) -> OrmResult<Vec<Box<dyn DatabaseRow>>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = if params.is_empty() {
        executor.fetch_all(sql).await
    } else {
        bind_params(sqlx::query(sql), params).fetch_all(executor).await
    };

    rows.map(|rows| rows.into_iter().map(boxed_row).collect())
        .map_err(|e| OrmError::Query(format!("Query fetch failed: {}", e)))
}

async fn fetch_optional_with<'e, E>(executor: E, sql: &'e str, params: &'e [DatabaseValue]) -> OrmResult<Option<Box<dyn DatabaseRow>>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = if params.is_empty() {
        executor.fetch_optional(sql).await
    } else {
        bind_params(sqlx::query(sql), params).fetch_optional(executor).await
    };

    row.map(|row| row.map(boxed_row))
        .map_err(|e| OrmError::Query(format!("Query fetch failed: {}", e)))
}

/// Bind DatabaseValues to a sqlx query
fn bind_params<'q>(
    mut query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &[DatabaseValue],
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    for value in params {
        query = match value {
            DatabaseValue::Null => query.bind(Option::<String>::None),
            DatabaseValue::Bool(b) => query.bind(*b),
            DatabaseValue::Int64(i) => query.bind(*i),
            DatabaseValue::Float64(f) => query.bind(*f),
            DatabaseValue::String(s) => query.bind(s.clone()),
            DatabaseValue::Bytes(b) => query.bind(b.clone()),
            // Same text layout as CURRENT_TIMESTAMP so stored values compare and sort alike
            DatabaseValue::DateTime(dt) => query.bind(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        };
    }
    query
}

/// Convert a SQLite value to DatabaseValue, driven by the value's storage class
fn sqlite_value_to_database_value(row: &SqliteRow, index: usize) -> OrmResult<DatabaseValue> {
    let raw = row
        .try_get_raw(index)
        .map_err(|e| OrmError::Query(format!("Failed to read column {}: {}", index, e)))?;

    if raw.is_null() {
        return Ok(DatabaseValue::Null);
    }

    let type_name = raw.type_info().name().to_string();
    let decoded = match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => row.try_get_unchecked::<i64, _>(index).map(DatabaseValue::Int64),
        "REAL" => row.try_get_unchecked::<f64, _>(index).map(DatabaseValue::Float64),
        "BLOB" => row
            .try_get_unchecked::<Vec<u8>, _>(index)
            .map(|bytes| match String::from_utf8(bytes) {
                Ok(text) => DatabaseValue::String(text),
                Err(e) => DatabaseValue::Bytes(e.into_bytes()),
            }),
        _ => row.try_get_unchecked::<String, _>(index).map(DatabaseValue::String),
    };

    decoded.map_err(|e| {
        OrmError::Query(format!(
            "Failed to decode column {} of type '{}': {}",
            index, type_name, e
        ))
    })
}
