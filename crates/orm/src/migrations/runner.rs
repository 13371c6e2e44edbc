//! Migration Runner - Executes migrations against the database
//!
//! Handles the actual execution of migrations, tracking applied migrations
//! in the ledger table, and managing migration batches.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::definitions::{
    Migration, MigrationConfig, MigrationRecord, MigrationRunResult, MigrationStatus, MigrationStatusEntry,
};
use super::registry::MigrationRegistry;
use crate::backends::{
    DatabaseConnection, DatabasePool, DatabaseRow, DatabaseRowExt, DatabaseTransaction, DatabaseValue,
};
use crate::error::{OrmError, OrmResult};

/// Applies, rolls back and reports on registered migrations
pub struct Migrator<'r> {
    pub(crate) pool: Arc<dyn DatabasePool>,
    pub(crate) registry: &'r MigrationRegistry,
    pub(crate) config: MigrationConfig,
}

impl<'r> Migrator<'r> {
    pub fn new(pool: Arc<dyn DatabasePool>, registry: &'r MigrationRegistry, config: MigrationConfig) -> Self {
        Self { pool, registry, config }
    }

    pub fn pool(&self) -> &Arc<dyn DatabasePool> {
        &self.pool
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Run all pending migrations as one new batch.
    ///
    /// Each migration runs in its own transaction together with its ledger
    /// row. The first failure stops the run; earlier migrations of the batch
    /// stay applied. MySQL commits DDL implicitly, so there a failed `up` may
    /// leave partial schema behind.
    pub async fn migrate(&self) -> OrmResult<MigrationRunResult> {
        let start_time = std::time::Instant::now();

        self.ensure_migrations_table().await?;

        let applied: HashSet<String> = self
            .applied_migrations()
            .await?
            .into_iter()
            .map(|record| record.migration)
            .collect();

        let (pending, skipped): (Vec<_>, Vec<_>) = self
            .registry
            .ordered()
            .into_iter()
            .partition(|migration| !applied.contains(&migration.key()));

        if pending.is_empty() {
            info!("Nothing to migrate");
            return Ok(MigrationRunResult {
                batch: None,
                applied_migrations: Vec::new(),
                skipped_count: skipped.len(),
                execution_time_ms: start_time.elapsed().as_millis(),
            });
        }

        let batch = self.next_batch_number().await?;
        let mut applied_migrations = Vec::with_capacity(pending.len());

        for migration in pending {
            let key = migration.key();
            info!("Migrating: {}", key);

            self.apply_migration(migration.as_ref(), &key, batch)
                .await
                .map_err(|e| OrmError::migration_failed(key.clone(), e))?;

            info!("Migrated: {}", key);
            applied_migrations.push(key);
        }

        Ok(MigrationRunResult {
            batch: Some(batch),
            applied_migrations,
            skipped_count: skipped.len(),
            execution_time_ms: start_time.elapsed().as_millis(),
        })
    }

    async fn apply_migration(&self, migration: &dyn Migration, key: &str, batch: i64) -> OrmResult<()> {
        let mut tx = self.pool.begin_transaction().await?;

        if let Err(e) = migration.up(tx.as_connection()).await {
            abort(tx).await;
            return Err(e);
        }

        let sql = format!(
            "INSERT INTO {} (migration, batch) VALUES (?, ?)",
            self.config.migrations_table
        );
        if let Err(e) = tx.execute(&sql, &[key.into(), batch.into()]).await {
            abort(tx).await;
            return Err(e);
        }

        tx.commit().await
    }

    /// Applied/pending state of every registered migration, in apply order.
    /// Ledger rows without a registered migration are listed last.
    pub async fn status(&self) -> OrmResult<Vec<MigrationStatusEntry>> {
        self.ensure_migrations_table().await?;

        let records = self.applied_migrations().await?;
        let mut by_key: HashMap<&str, &MigrationRecord> =
            records.iter().map(|r| (r.migration.as_str(), r)).collect();

        let mut entries: Vec<MigrationStatusEntry> = self
            .registry
            .ordered()
            .iter()
            .map(|migration| {
                let key = migration.key();
                let status = match by_key.remove(key.as_str()) {
                    Some(record) => MigrationStatus::Applied {
                        batch: record.batch,
                        executed_at: record.executed_at,
                    },
                    None => MigrationStatus::Pending,
                };
                MigrationStatusEntry { key, status }
            })
            .collect();

        for record in records.iter().filter(|r| by_key.contains_key(r.migration.as_str())) {
            warn!("Ledger entry '{}' has no registered migration", record.migration);
            entries.push(MigrationStatusEntry {
                key: record.migration.clone(),
                status: MigrationStatus::Orphaned {
                    batch: record.batch,
                    executed_at: record.executed_at,
                },
            });
        }

        Ok(entries)
    }

    /// Ensure the migrations ledger exists
    pub async fn ensure_migrations_table(&self) -> OrmResult<()> {
        let sql = self
            .pool
            .dialect()
            .create_migrations_table_sql(&self.config.migrations_table);
        self.pool.execute(&sql, &[]).await?;
        debug!("Ensured ledger table '{}'", self.config.migrations_table);
        Ok(())
    }

    /// Every ledger row in insertion order
    pub async fn applied_migrations(&self) -> OrmResult<Vec<MigrationRecord>> {
        let sql = format!(
            "SELECT id, migration, batch, executed_at FROM {} ORDER BY id",
            self.config.migrations_table
        );
        let rows = self.pool.fetch_all(&sql, &[]).await?;
        rows.iter().map(|row| migration_record(row.as_ref())).collect()
    }

    /// Ledger rows of one batch, newest first
    pub async fn migrations_in_batch(&self, batch: i64) -> OrmResult<Vec<MigrationRecord>> {
        let sql = format!(
            "SELECT id, migration, batch, executed_at FROM {} WHERE batch = ? ORDER BY id DESC",
            self.config.migrations_table
        );
        let rows = self.pool.fetch_all(&sql, &[DatabaseValue::Int64(batch)]).await?;
        rows.iter().map(|row| migration_record(row.as_ref())).collect()
    }

    /// Highest batch in the ledger, 0 when empty
    pub async fn latest_batch_number(&self) -> OrmResult<i64> {
        let sql = format!(
            "SELECT COALESCE(MAX(batch), 0) AS batch FROM {}",
            self.config.migrations_table
        );
        match self.pool.fetch_optional(&sql, &[]).await? {
            Some(row) => row.get_i64("batch"),
            None => Ok(0),
        }
    }

    async fn next_batch_number(&self) -> OrmResult<i64> {
        Ok(self.latest_batch_number().await? + 1)
    }
}

fn migration_record(row: &dyn DatabaseRow) -> OrmResult<MigrationRecord> {
    Ok(MigrationRecord {
        id: row.get_i64("id")?,
        migration: row.get_string("migration")?,
        batch: row.get_i64("batch")?,
        executed_at: row.get_optional_datetime("executed_at")?,
    })
}

/// Roll back a transaction whose work already failed
pub(crate) async fn abort(tx: Box<dyn DatabaseTransaction>) {
    if let Err(e) = tx.rollback().await {
        warn!("Failed to roll back transaction: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{DatabaseBackend, DatabasePoolConfig, SqliteBackend};
    use crate::migrations::SqlMigration;

    async fn memory_pool() -> Arc<dyn DatabasePool> {
        SqliteBackend::new()
            .create_pool("sqlite::memory:", DatabasePoolConfig::single_connection())
            .await
            .unwrap()
    }

    fn users_migration() -> SqlMigration {
        SqlMigration::new("2024_01_01_000001", "create_users_table")
            .up("CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, email VARCHAR(255) NOT NULL)")
            .down("DROP TABLE users")
    }

    #[tokio::test]
    async fn test_migrate_assigns_single_batch() {
        let pool = memory_pool().await;
        let mut registry = MigrationRegistry::new();
        registry.register(users_migration()).unwrap();
        registry
            .register(
                SqlMigration::new("2024_01_01_000002", "create_roles_table")
                    .up("CREATE TABLE roles (id INTEGER PRIMARY KEY AUTOINCREMENT)")
                    .down("DROP TABLE roles"),
            )
            .unwrap();

        let migrator = Migrator::new(pool.clone(), &registry, MigrationConfig::default());
        let result = migrator.migrate().await.unwrap();

        assert_eq!(result.batch, Some(1));
        assert_eq!(result.applied_count(), 2);

        let records = migrator.applied_migrations().await.unwrap();
        assert!(records.iter().all(|r| r.batch == 1));
        assert_eq!(records[0].migration, "2024_01_01_000001_create_users_table");
    }

    #[tokio::test]
    async fn test_failed_migration_leaves_no_ledger_row() {
        let pool = memory_pool().await;
        let mut registry = MigrationRegistry::new();
        registry.register(users_migration()).unwrap();
        registry
            .register(SqlMigration::new("2024_01_01_000002", "broken").up("CREATE TABLE users (id INTEGER)"))
            .unwrap();

        let migrator = Migrator::new(pool.clone(), &registry, MigrationConfig::default());
        let err = migrator.migrate().await.unwrap_err();

        match err {
            OrmError::MigrationFailed { migration, .. } => assert_eq!(migration, "2024_01_01_000002_broken"),
            other => panic!("unexpected error: {other:?}"),
        }

        let records = migrator.applied_migrations().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].migration, "2024_01_01_000001_create_users_table");
    }

    #[tokio::test]
    async fn test_status_reports_pending_and_applied() {
        let pool = memory_pool().await;
        let mut registry = MigrationRegistry::new();
        registry.register(users_migration()).unwrap();

        let migrator = Migrator::new(pool.clone(), &registry, MigrationConfig::default());
        let before = migrator.status().await.unwrap();
        assert_eq!(before[0].status, MigrationStatus::Pending);

        migrator.migrate().await.unwrap();
        let after = migrator.status().await.unwrap();
        assert!(matches!(after[0].status, MigrationStatus::Applied { batch: 1, .. }));
    }
}
