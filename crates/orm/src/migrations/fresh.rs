//! Drop every table and migrate from scratch

use tracing::{debug, warn};

use super::definitions::FreshResult;
use super::runner::Migrator;
use crate::backends::{DatabaseConnection, DatabaseRowExt};
use crate::error::OrmResult;

impl<'r> Migrator<'r> {
    /// Drop all tables, recreate the ledger and run every migration.
    ///
    /// Foreign key checks are disabled on one dedicated connection for the
    /// drops and re-enabled even when a drop fails.
    pub async fn fresh(&self) -> OrmResult<FreshResult> {
        warn!("Dropping all tables");

        let dropped_tables = {
            let mut conn = self.pool.acquire().await?;
            let dialect = conn.dialect();

            conn.execute(dialect.disable_foreign_keys_sql(), &[]).await?;
            let dropped = self.drop_all_tables(conn.as_mut()).await;
            let restored = conn.execute(dialect.enable_foreign_keys_sql(), &[]).await;

            let dropped = dropped?;
            restored?;
            dropped
        };

        self.ensure_migrations_table().await?;
        let run = self.migrate().await?;

        Ok(FreshResult { dropped_tables, run })
    }

    async fn drop_all_tables(&self, conn: &mut dyn DatabaseConnection) -> OrmResult<Vec<String>> {
        let dialect = conn.dialect();
        let rows = conn.fetch_all(dialect.list_tables_sql(), &[]).await?;
        let tables = rows
            .iter()
            .map(|row| row.first_string())
            .collect::<OrmResult<Vec<String>>>()?;

        let order = self.drop_order(tables);
        for table in &order {
            conn.execute(&dialect.drop_table_sql(table), &[]).await?;
            debug!("Dropped table {}", table);
        }

        Ok(order)
    }

    /// Tables matching a drop-first pattern, then the rest, ledger last
    pub(crate) fn drop_order(&self, tables: Vec<String>) -> Vec<String> {
        let ledger = self.config.migrations_table.to_lowercase();
        let (ledger_tables, tables): (Vec<_>, Vec<_>) =
            tables.into_iter().partition(|t| t.to_lowercase() == ledger);

        let (mut order, rest): (Vec<_>, Vec<_>) = tables.into_iter().partition(|t| {
            let name = t.to_lowercase();
            self.config
                .drop_first_patterns
                .iter()
                .any(|pattern| name.contains(&pattern.to_lowercase()))
        });

        order.extend(rest);
        order.extend(ledger_tables);
        order
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::backends::{DatabaseBackend, DatabasePool, DatabasePoolConfig, SqliteBackend};
    use crate::migrations::{MigrationConfig, MigrationRegistry, SqlMigration};

    async fn memory_pool() -> Arc<dyn DatabasePool> {
        SqliteBackend::new()
            .create_pool("sqlite::memory:", DatabasePoolConfig::single_connection())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_drop_order_puts_token_tables_first() {
        let pool = memory_pool().await;
        let registry = MigrationRegistry::new();
        let migrator = Migrator::new(pool, &registry, MigrationConfig::default());

        let order = migrator.drop_order(vec![
            "migrations".to_string(),
            "users".to_string(),
            "personal_access_tokens".to_string(),
            "posts".to_string(),
        ]);

        assert_eq!(order, vec!["personal_access_tokens", "users", "posts", "migrations"]);
    }

    #[tokio::test]
    async fn test_fresh_rebuilds_schema() {
        let pool = memory_pool().await;
        pool.execute("CREATE TABLE leftovers (id INTEGER)", &[]).await.unwrap();

        let mut registry = MigrationRegistry::new();
        registry
            .register(
                SqlMigration::new("2024_01_01_000001", "create_users_table")
                    .up("CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT)")
                    .down("DROP TABLE users"),
            )
            .unwrap();

        let migrator = Migrator::new(pool.clone(), &registry, MigrationConfig::default());
        migrator.migrate().await.unwrap();

        let result = migrator.fresh().await.unwrap();
        assert!(result.dropped_tables.contains(&"leftovers".to_string()));
        assert_eq!(result.dropped_tables.last().map(String::as_str), Some("migrations"));
        assert_eq!(result.run.batch, Some(1));

        let tables = pool
            .fetch_all("SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'leftovers'", &[])
            .await
            .unwrap();
        assert!(tables.is_empty());
    }
}
