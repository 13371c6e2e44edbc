//! MySQL Backend Implementation
//!
//! MySQL implementation of the database backend traits using sqlx as the
//! underlying driver.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use sqlx::mysql::{MySql, MySqlArguments, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Executor, Pool, Row, TypeInfo, ValueRef};

use super::core::*;
use crate::error::{OrmError, OrmResult};

/// MySQL database backend implementation
#[derive(Debug, Default)]
pub struct MySqlBackend;

impl MySqlBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DatabaseBackend for MySqlBackend {
    async fn create_pool(&self, database_url: &str, config: DatabasePoolConfig) -> OrmResult<Arc<dyn DatabasePool>> {
        self.validate_database_url(database_url)?;

        let options = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections.min(config.max_connections))
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .test_before_acquire(config.test_before_acquire)
            .idle_timeout(config.idle_timeout_seconds.map(Duration::from_secs))
            .max_lifetime(config.max_lifetime_seconds.map(Duration::from_secs));

        let sqlx_pool = options
            .connect(database_url)
            .await
            .map_err(|e| OrmError::Connection(format!("Failed to create MySQL pool: {}", e)))?;

        Ok(Arc::new(MySqlDatabasePool::new(sqlx_pool)))
    }

    fn sql_dialect(&self) -> SqlDialect {
        SqlDialect::MySQL
    }

    fn validate_database_url(&self, url: &str) -> OrmResult<()> {
        if !url.starts_with("mysql://") {
            return Err(OrmError::Connection("Invalid MySQL URL scheme".to_string()));
        }
        Ok(())
    }
}

/// MySQL connection pool implementation
pub struct MySqlDatabasePool {
    pool: Pool<MySql>,
}

impl MySqlDatabasePool {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DatabasePool for MySqlDatabasePool {
    async fn acquire(&self) -> OrmResult<Box<dyn DatabaseConnection>> {
        let conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| OrmError::Connection(format!("Failed to acquire connection: {}", e)))?;

        Ok(Box::new(MySqlDatabaseConnection { conn }))
    }

    async fn begin_transaction(&self) -> OrmResult<Box<dyn DatabaseTransaction>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| OrmError::Transaction(format!("Failed to begin transaction: {}", e)))?;

        Ok(Box::new(MySqlDatabaseTransaction { tx: Some(tx) }))
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
        SqlDialect::MySQL
    }
}

/// MySQL pooled connection implementation
pub struct MySqlDatabaseConnection {
    conn: sqlx::pool::PoolConnection<MySql>,
}

#[async_trait]
impl DatabaseConnection for MySqlDatabaseConnection {
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
        SqlDialect::MySQL
    }
}

/// MySQL transaction implementation
pub struct MySqlDatabaseTransaction {
    tx: Option<sqlx::Transaction<'static, MySql>>,
}

impl MySqlDatabaseTransaction {
    fn tx(&mut self) -> OrmResult<&mut sqlx::Transaction<'static, MySql>> {
        self.tx
            .as_mut()
            .ok_or_else(|| OrmError::Transaction("Transaction already completed".to_string()))
    }
}

#[async_trait]
impl DatabaseConnection for MySqlDatabaseTransaction {
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
        SqlDialect::MySQL
    }
}

#[async_trait]
impl DatabaseTransaction for MySqlDatabaseTransaction {
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

/// MySQL row implementation
pub struct MySqlDatabaseRow {
    row: MySqlRow,
}

impl DatabaseRow for MySqlDatabaseRow {
    fn get_by_index(&self, index: usize) -> OrmResult<DatabaseValue> {
        if index >= self.row.len() {
            return Err(OrmError::Query(format!("Column index {} out of range", index)));
        }
        mysql_value_to_database_value(&self.row, index)
    }

    fn get_by_name(&self, name: &str) -> OrmResult<DatabaseValue> {
        // information_schema reports column names in upper case on MySQL 8
        let index = self
            .row
            .columns()
            .iter()
            .position(|col| col.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| OrmError::Query(format!("Column '{}' not found", name)))?;

        mysql_value_to_database_value(&self.row, index)
    }

    fn column_count(&self) -> usize {
        self.row.len()
    }

    fn column_names(&self) -> Vec<String> {
        self.row.columns().iter().map(|col| col.name().to_string()).collect()
    }
}

fn boxed_row(row: MySqlRow) -> Box<dyn DatabaseRow> {
    Box::new(MySqlDatabaseRow { row })
}

async fn execute_with<'e, E>(executor: E, sql: &'e str, params: &'e [DatabaseValue]) -> OrmResult<u64>
where
    E: Executor<'e, Database = MySql>,
{
    // Parameterless statements go over the text protocol, which accepts
    // statements MySQL refuses to prepare.
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
    E: Executor<'e, Database = MySql>,
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
    E: Executor<'e, Database = MySql>,
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
    mut query: sqlx::query::Query<'q, MySql, MySqlArguments>,
    params: &[DatabaseValue],
) -> sqlx::query::Query<'q, MySql, MySqlArguments> {
    for value in params {
        query = match value {
            DatabaseValue::Null => query.bind(Option::<String>::None),
            DatabaseValue::Bool(b) => query.bind(*b),
            DatabaseValue::Int64(i) => query.bind(*i),
            DatabaseValue::Float64(f) => query.bind(*f),
            DatabaseValue::String(s) => query.bind(s.clone()),
            DatabaseValue::Bytes(b) => query.bind(b.clone()),
            DatabaseValue::DateTime(dt) => query.bind(dt.naive_utc()),
        };
    }
    query
}

/// Convert a MySQL column value to DatabaseValue
fn mysql_value_to_database_value(row: &MySqlRow, index: usize) -> OrmResult<DatabaseValue> {
    let raw = row
        .try_get_raw(index)
        .map_err(|e| OrmError::Query(format!("Failed to read column {}: {}", index, e)))?;

    if raw.is_null() {
        return Ok(DatabaseValue::Null);
    }

    let type_name = raw.type_info().name().to_string();
    let decoded = match type_name.as_str() {
        "BOOLEAN" => row.try_get_unchecked::<bool, _>(index).map(DatabaseValue::Bool),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            row.try_get_unchecked::<i64, _>(index).map(DatabaseValue::Int64)
        }
        name if name.ends_with("UNSIGNED") => row.try_get_unchecked::<u64, _>(index).map(|v| {
            i64::try_from(v)
                .map(DatabaseValue::Int64)
                .unwrap_or_else(|_| DatabaseValue::String(v.to_string()))
        }),
        "FLOAT" => row
            .try_get_unchecked::<f32, _>(index)
            .map(|v| DatabaseValue::Float64(f64::from(v))),
        "DOUBLE" => row.try_get_unchecked::<f64, _>(index).map(DatabaseValue::Float64),
        "DATETIME" => row
            .try_get_unchecked::<NaiveDateTime, _>(index)
            .map(|v| DatabaseValue::DateTime(Utc.from_utc_datetime(&v))),
        "TIMESTAMP" => row
            .try_get_unchecked::<DateTime<Utc>, _>(index)
            .map(DatabaseValue::DateTime),
        "DATE" => row
            .try_get_unchecked::<NaiveDate, _>(index)
            .map(|v| DatabaseValue::String(v.to_string())),
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => row
            .try_get_unchecked::<Vec<u8>, _>(index)
            .map(|bytes| match String::from_utf8(bytes) {
                Ok(text) => DatabaseValue::String(text),
                Err(e) => DatabaseValue::Bytes(e.into_bytes()),
            }),
        _ => row
            .try_get_unchecked::<String, _>(index)
            .map(DatabaseValue::String)
            .or_else(|_| {
                row.try_get_unchecked::<Vec<u8>, _>(index)
                    .map(|bytes| DatabaseValue::String(String::from_utf8_lossy(&bytes).into_owned()))
            }),
    };

    decoded.map_err(|e| {
        OrmError::Query(format!(
            "Failed to decode column {} of type '{}': {}",
            index, type_name, e
        ))
    })
}
