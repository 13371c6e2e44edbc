//! Seeder manager for running seeders with their dependencies

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use super::audit;
use super::plan::{self, MissingDependency};
use super::registry::SeederRegistry;
use super::seeder::{CleanResult, Seeder, SeederConfig, SeederRunResult, SeederStatus, SeederStatusEntry};
use crate::backends::{DatabasePool, DatabaseTransaction};
use crate::error::{OrmError, OrmResult};
use crate::migrations::runner::abort;

/// Runs, rolls back and reports on registered seeders
pub struct SeederManager<'r> {
    pool: Arc<dyn DatabasePool>,
    registry: &'r SeederRegistry,
    config: SeederConfig,
}

impl<'r> SeederManager<'r> {
    pub fn new(pool: Arc<dyn DatabasePool>, registry: &'r SeederRegistry, config: SeederConfig) -> Self {
        Self { pool, registry, config }
    }

    pub fn config(&self) -> &SeederConfig {
        &self.config
    }

    /// Run a seeder after its dependencies.
    ///
    /// Dependencies are expanded depth-first on every call, so a dependency
    /// shared by several branches is reseeded each time it is reached. Every
    /// step runs `rollback` then `seed` in one transaction.
    pub async fn run_seeder(&self, name: &str) -> OrmResult<SeederRunResult> {
        let start_time = std::time::Instant::now();
        let steps = plan::expand(self.registry, name)?;

        self.ensure_audit_table().await;

        let mut result = SeederRunResult::default();
        for step in steps {
            let seeder = self
                .registry
                .get(&step)
                .ok_or_else(|| OrmError::SeederNotFound(step.clone()))?;

            if self.is_seeder_executed(&step).await {
                info!("Skipping seeder {}: already executed", step);
                result.skipped.push(step);
                continue;
            }

            info!("Seeding: {}", step);
            if let Err(e) = self.execute_step(seeder.as_ref()).await {
                return Err(if step == name {
                    OrmError::seeder_failed(name, e)
                } else {
                    OrmError::SeederDependency {
                        seeder: name.to_string(),
                        dependency: step,
                        source: Box::new(e),
                    }
                });
            }
            info!("Seeded: {}", step);
            result.executed.push(step);
        }

        result.execution_time_ms = start_time.elapsed().as_millis();
        Ok(result)
    }

    async fn execute_step(&self, seeder: &dyn Seeder) -> OrmResult<()> {
        let mut tx = self.pool.begin_transaction().await?;

        if let Err(e) = seeder.rollback(tx.as_connection()).await {
            warn!("Rollback before reseeding {} failed: {}", seeder.name(), e);
        }

        if let Err(e) = seeder.seed(tx.as_connection()).await {
            abort(tx).await;
            return Err(e);
        }

        if let Err(e) = audit::record_execution(tx.as_connection(), &self.config.audit_table, seeder.name()).await {
            warn!("Failed to record execution of seeder {}: {}", seeder.name(), e);
        }

        tx.commit().await
    }

    /// Run every registered seeder once at the top level, dependencies first
    pub async fn run_all_seeders(&self) -> OrmResult<SeederRunResult> {
        let start_time = std::time::Instant::now();
        let order = plan::combined_order(self.registry, MissingDependency::Fail)?;

        let mut executed: HashSet<String> = HashSet::new();
        let mut result = SeederRunResult::default();

        for name in order {
            if executed.contains(&name) {
                continue;
            }
            let run = self.run_seeder(&name).await?;
            executed.extend(run.executed.iter().cloned());
            executed.insert(name);
            result.merge(run);
        }

        info!("All seeders completed");
        result.execution_time_ms = start_time.elapsed().as_millis();
        Ok(result)
    }

    /// Undo one seeder's data and mark it rolled back
    pub async fn rollback_seeder(&self, name: &str) -> OrmResult<()> {
        let seeder = self
            .registry
            .get(name)
            .ok_or_else(|| OrmError::SeederNotFound(name.to_string()))?;

        self.ensure_audit_table().await;

        info!("Rolling back seeder: {}", name);
        let mut tx = self.pool.begin_transaction().await?;

        if let Err(e) = seeder.rollback(tx.as_connection()).await {
            abort(tx).await;
            return Err(OrmError::seeder_failed(name, e));
        }

        if let Err(e) = audit::record_rollback(tx.as_connection(), &self.config.audit_table, name).await {
            warn!("Failed to record rollback of seeder {}: {}", name, e);
        }

        tx.commit().await?;
        info!("Rolled back seeder: {}", name);
        Ok(())
    }

    /// Roll back then reseed a seeder and its dependencies
    pub async fn reset_seeder(&self, name: &str) -> OrmResult<SeederRunResult> {
        self.run_seeder(name).await
    }

    /// Roll back every registered seeder, dependents first. Failures are
    /// logged and cleaning continues.
    pub async fn clean_all_seeder_data(&self) -> OrmResult<CleanResult> {
        let order = plan::combined_order(self.registry, MissingDependency::Skip)?;
        let mut result = CleanResult::default();

        for name in order.into_iter().rev() {
            match self.rollback_seeder(&name).await {
                Ok(()) => result.cleaned.push(name),
                Err(e) => {
                    warn!("Failed to clean seeder {}: {}", name, e);
                    result.failed.push(name);
                }
            }
        }

        Ok(result)
    }

    /// Audit state of every registered seeder in registration order
    pub async fn seeder_status(&self) -> OrmResult<Vec<SeederStatusEntry>> {
        self.ensure_audit_table().await;

        let mut entries = Vec::with_capacity(self.registry.len());
        for name in self.registry.names() {
            let status = match audit::find(self.pool.as_ref(), &self.config.audit_table, &name).await {
                Ok(Some(record)) => match (record.rollback_at, record.executed_at) {
                    (Some(at), _) => SeederStatus::RolledBack { at },
                    (None, Some(at)) => SeederStatus::Executed { at },
                    (None, None) => SeederStatus::NotExecuted,
                },
                Ok(None) => SeederStatus::NotExecuted,
                Err(e) => {
                    warn!("Failed to read audit row of seeder {}: {}", name, e);
                    SeederStatus::NotExecuted
                }
            };
            entries.push(SeederStatusEntry { name, status });
        }

        Ok(entries)
    }

    /// Whether a seeder should be skipped. Always `false` with `force_reseed`.
    pub async fn is_seeder_executed(&self, name: &str) -> bool {
        if self.config.force_reseed {
            return false;
        }

        match audit::find(self.pool.as_ref(), &self.config.audit_table, name).await {
            Ok(record) => record.map_or(false, |r| r.is_active()),
            Err(e) => {
                warn!("Failed to read audit row of seeder {}: {}", name, e);
                false
            }
        }
    }

    async fn ensure_audit_table(&self) {
        if let Err(e) = audit::ensure_table(self.pool.as_ref(), &self.config.audit_table).await {
            warn!("Failed to create seeder audit table: {}", e);
        }
    }
}
