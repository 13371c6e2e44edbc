//! Reads table structure from a live database

use std::collections::HashMap;
use std::sync::Arc;

use strata_orm::{DatabasePool, SqlDialect};
use tracing::debug;

use crate::error::{IntrospectError, IntrospectResult};
use crate::model::{ForeignKeyInfo, TableInfo};
use crate::ordering::order_by_dependency;
use crate::{mysql, sqlite};

/// Schema introspector over a connection pool
pub struct SchemaInspector {
    pool: Arc<dyn DatabasePool>,
    migrations_table: String,
}

impl SchemaInspector {
    pub fn new(pool: Arc<dyn DatabasePool>) -> Self {
        Self {
            pool,
            migrations_table: "migrations".to_string(),
        }
    }

    /// Name of the ledger table left out of listings
    pub fn with_migrations_table(mut self, table: impl Into<String>) -> Self {
        self.migrations_table = table.into();
        self
    }

    /// Every table except the migration ledger
    pub async fn list_tables(&self) -> IntrospectResult<Vec<String>> {
        let pool = self.pool.as_ref();
        let tables = match pool.dialect() {
            SqlDialect::MySQL => mysql::list_tables(pool).await?,
            SqlDialect::SQLite => sqlite::list_tables(pool).await?,
        };

        Ok(tables
            .into_iter()
            .filter(|t| !t.eq_ignore_ascii_case(&self.migrations_table))
            .collect())
    }

    /// Columns, secondary indexes and foreign keys of one table
    pub async fn describe_table(&self, table: &str) -> IntrospectResult<TableInfo> {
        let pool = self.pool.as_ref();
        debug!("Describing table {}", table);

        let info = match pool.dialect() {
            SqlDialect::MySQL => {
                if !mysql::table_exists(pool, table).await? {
                    return Err(IntrospectError::TableNotFound(table.to_string()));
                }
                TableInfo {
                    name: table.to_string(),
                    columns: mysql::columns(pool, table).await?,
                    indexes: mysql::indexes(pool, table).await?,
                    foreign_keys: mysql::foreign_keys(pool, table).await?,
                }
            }
            SqlDialect::SQLite => {
                let ddl = sqlite::table_sql(pool, table)
                    .await?
                    .ok_or_else(|| IntrospectError::TableNotFound(table.to_string()))?;
                let index_list = sqlite::index_list(pool, table).await?;
                TableInfo {
                    name: table.to_string(),
                    columns: sqlite::columns(pool, table, &ddl, &index_list).await?,
                    indexes: sqlite::indexes(&index_list),
                    foreign_keys: sqlite::foreign_keys(pool, table).await?,
                }
            }
        };

        Ok(info)
    }

    /// Foreign keys declared on one table
    pub async fn foreign_keys(&self, table: &str) -> IntrospectResult<Vec<ForeignKeyInfo>> {
        let pool = self.pool.as_ref();
        match pool.dialect() {
            SqlDialect::MySQL => mysql::foreign_keys(pool, table).await,
            SqlDialect::SQLite => sqlite::foreign_keys(pool, table).await,
        }
    }

    /// All tables, referenced tables before the tables referencing them
    pub async fn ordered_tables(&self) -> IntrospectResult<Vec<String>> {
        let tables = self.list_tables().await?;

        let mut foreign_keys = HashMap::with_capacity(tables.len());
        for table in &tables {
            foreign_keys.insert(table.clone(), self.foreign_keys(table).await?);
        }

        order_by_dependency(&tables, &foreign_keys)
    }

    /// Full description of every table in dependency order
    pub async fn describe_ordered(&self) -> IntrospectResult<Vec<TableInfo>> {
        let mut described = Vec::new();
        for table in self.ordered_tables().await? {
            described.push(self.describe_table(&table).await?);
        }
        Ok(described)
    }
}
