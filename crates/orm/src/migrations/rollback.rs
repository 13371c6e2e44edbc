//! Migration Rollback - Handles rolling back applied migrations
//!
//! Reverts the most recent batch, newest migration first, executing each
//! `down` in its own transaction together with the ledger delete.

use std::sync::Arc;

use tracing::info;

use super::definitions::{Migration, MigrationRecord, RollbackResult};
use super::runner::{abort, Migrator};
use crate::backends::{DatabaseConnection, DatabaseTransaction, DatabaseValue};
use crate::error::{OrmError, OrmResult};

impl<'r> Migrator<'r> {
    /// Roll back the last batch of migrations
    pub async fn rollback(&self) -> OrmResult<RollbackResult> {
        self.ensure_migrations_table().await?;

        let latest_batch = self.latest_batch_number().await?;
        if latest_batch == 0 {
            info!("Nothing to rollback");
            return Ok(RollbackResult::default());
        }

        self.rollback_batch(latest_batch).await
    }

    /// Roll back every migration recorded in `batch`, newest first.
    ///
    /// All ledger rows are resolved against the registry before anything is
    /// reverted, so an unregistered entry aborts the rollback untouched.
    pub async fn rollback_batch(&self, batch: i64) -> OrmResult<RollbackResult> {
        let start_time = std::time::Instant::now();

        let records = self.migrations_in_batch(batch).await?;
        let resolved = records
            .into_iter()
            .map(|record| match self.registry.find(&record.migration) {
                Some(migration) => Ok((record, migration)),
                None => Err(OrmError::UnknownMigration { key: record.migration }),
            })
            .collect::<OrmResult<Vec<(MigrationRecord, Arc<dyn Migration>)>>>()?;

        let mut rolled_back_migrations = Vec::with_capacity(resolved.len());

        for (record, migration) in resolved {
            info!("Rolling back: {}", record.migration);

            self.revert_migration(migration.as_ref(), &record)
                .await
                .map_err(|e| OrmError::rollback_failed(record.migration.clone(), e))?;

            info!("Rolled back: {}", record.migration);
            rolled_back_migrations.push(record.migration);
        }

        Ok(RollbackResult {
            batch: Some(batch),
            rolled_back_migrations,
            execution_time_ms: start_time.elapsed().as_millis(),
        })
    }

    async fn revert_migration(&self, migration: &dyn Migration, record: &MigrationRecord) -> OrmResult<()> {
        let mut tx = self.pool.begin_transaction().await?;

        if let Err(e) = migration.down(tx.as_connection()).await {
            abort(tx).await;
            return Err(e);
        }

        let sql = format!("DELETE FROM {} WHERE id = ?", self.config.migrations_table);
        if let Err(e) = tx.execute(&sql, &[DatabaseValue::Int64(record.id)]).await {
            abort(tx).await;
            return Err(e);
        }

        tx.commit().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{DatabaseBackend, DatabasePool, DatabasePoolConfig, SqliteBackend};
    use crate::migrations::{MigrationConfig, MigrationRegistry, SqlMigration};

    async fn memory_pool() -> Arc<dyn DatabasePool> {
        SqliteBackend::new()
            .create_pool("sqlite::memory:", DatabasePoolConfig::single_connection())
            .await
            .unwrap()
    }

    fn create_table(ts: &str, table: &str) -> SqlMigration {
        SqlMigration::new(ts, format!("create_{}_table", table))
            .up(format!("CREATE TABLE {} (id INTEGER PRIMARY KEY)", table))
            .down(format!("DROP TABLE {}", table))
    }

    #[tokio::test]
    async fn test_rollback_reverts_latest_batch_only() {
        let pool = memory_pool().await;
        let mut first = MigrationRegistry::new();
        first.register(create_table("2024_01_01_000001", "users")).unwrap();

        Migrator::new(pool.clone(), &first, MigrationConfig::default())
            .migrate()
            .await
            .unwrap();

        let mut second = MigrationRegistry::new();
        second.register(create_table("2024_01_01_000001", "users")).unwrap();
        second.register(create_table("2024_01_01_000002", "posts")).unwrap();
        second.register(create_table("2024_01_01_000003", "tags")).unwrap();

        let migrator = Migrator::new(pool.clone(), &second, MigrationConfig::default());
        assert_eq!(migrator.migrate().await.unwrap().batch, Some(2));

        let result = migrator.rollback().await.unwrap();
        assert_eq!(result.batch, Some(2));
        assert_eq!(
            result.rolled_back_migrations,
            vec!["2024_01_01_000003_create_tags_table", "2024_01_01_000002_create_posts_table"]
        );

        let remaining = migrator.applied_migrations().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].batch, 1);
    }

    #[tokio::test]
    async fn test_rollback_on_empty_ledger() {
        let pool = memory_pool().await;
        let registry = MigrationRegistry::new();
        let migrator = Migrator::new(pool, &registry, MigrationConfig::default());

        let result = migrator.rollback().await.unwrap();
        assert_eq!(result.batch, None);
        assert_eq!(result.rolled_back_count(), 0);
    }

    #[tokio::test]
    async fn test_unregistered_ledger_entry_is_fatal() {
        let pool = memory_pool().await;
        let mut registry = MigrationRegistry::new();
        registry.register(create_table("2024_01_01_000001", "users")).unwrap();
        Migrator::new(pool.clone(), &registry, MigrationConfig::default())
            .migrate()
            .await
            .unwrap();

        let empty = MigrationRegistry::new();
        let err = Migrator::new(pool.clone(), &empty, MigrationConfig::default())
            .rollback()
            .await
            .unwrap_err();

        assert!(matches!(err, OrmError::UnknownMigration { ref key } if key == "2024_01_01_000001_create_users_table"));
    }
}
