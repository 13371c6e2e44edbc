//! Seeder audit table access

use chrono::{DateTime, Utc};

use crate::backends::{DatabaseConnection, DatabasePool, DatabaseRowExt, DatabaseValue};
use crate::error::OrmResult;

/// Audit row of one seeder
#[derive(Debug, Clone, PartialEq)]
pub struct SeederRecord {
    pub name: String,
    pub executed_at: Option<DateTime<Utc>>,
    pub rollback_at: Option<DateTime<Utc>>,
}

impl SeederRecord {
    /// Executed and not rolled back since
    pub fn is_active(&self) -> bool {
        self.executed_at.is_some() && self.rollback_at.is_none()
    }
}

pub(crate) async fn ensure_table(pool: &dyn DatabasePool, table: &str) -> OrmResult<()> {
    let sql = pool.dialect().create_seeders_table_sql(table);
    pool.execute(&sql, &[]).await?;
    Ok(())
}

pub(crate) async fn find(pool: &dyn DatabasePool, table: &str, name: &str) -> OrmResult<Option<SeederRecord>> {
    let sql = format!("SELECT name, executed_at, rollback_at FROM {} WHERE name = ?", table);
    match pool.fetch_optional(&sql, &[DatabaseValue::from(name)]).await? {
        Some(row) => Ok(Some(SeederRecord {
            name: row.get_string("name")?,
            executed_at: row.get_optional_datetime("executed_at")?,
            rollback_at: row.get_optional_datetime("rollback_at")?,
        })),
        None => Ok(None),
    }
}

/// Mark a seeder executed, clearing any earlier rollback
pub(crate) async fn record_execution(conn: &mut dyn DatabaseConnection, table: &str, name: &str) -> OrmResult<()> {
    let lookup = format!("SELECT id FROM {} WHERE name = ?", table);
    let exists = conn.fetch_optional(&lookup, &[DatabaseValue::from(name)]).await?.is_some();

    let sql = if exists {
        format!(
            "UPDATE {} SET executed_at = CURRENT_TIMESTAMP, rollback_at = NULL WHERE name = ?",
            table
        )
    } else {
        format!("INSERT INTO {} (name, executed_at) VALUES (?, CURRENT_TIMESTAMP)", table)
    };
    conn.execute(&sql, &[DatabaseValue::from(name)]).await?;

    Ok(())
}

pub(crate) async fn record_rollback(conn: &mut dyn DatabaseConnection, table: &str, name: &str) -> OrmResult<()> {
    let sql = format!("UPDATE {} SET rollback_at = CURRENT_TIMESTAMP WHERE name = ?", table);
    conn.execute(&sql, &[DatabaseValue::from(name)]).await?;
    Ok(())
}
