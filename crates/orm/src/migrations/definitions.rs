//! Migration Definitions - Core types and structures for migrations
//!
//! Defines the `Migration` trait implemented by every schema change, the
//! ledger record, configuration and run results.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

use crate::backends::DatabaseConnection;
use crate::error::OrmResult;

/// Timestamp layout used in migration keys and generated file names
pub const TIMESTAMP_FORMAT: &str = "%Y_%m_%d_%H%M%S";

/// Ledger key of a migration: `{timestamp}_{name}`
pub fn migration_key(timestamp: &str, name: &str) -> String {
    format!("{}_{}", timestamp, name)
}

/// A versioned schema change.
///
/// `timestamp` must sort lexicographically in apply order, e.g.
/// `2024_01_01_000001`. Both directions receive the connection of the
/// transaction the runner opened for this step.
#[async_trait]
pub trait Migration: Send + Sync {
    /// Stable name, e.g. `create_users_table`
    fn name(&self) -> &str;

    /// Sortable timestamp, e.g. `2024_01_01_000001`
    fn timestamp(&self) -> &str;

    /// Apply the change
    async fn up(&self, conn: &mut dyn DatabaseConnection) -> OrmResult<()>;

    /// Revert the change
    async fn down(&self, conn: &mut dyn DatabaseConnection) -> OrmResult<()>;

    /// Ledger key
    fn key(&self) -> String {
        migration_key(self.timestamp(), self.name())
    }
}

/// Migration defined by plain SQL statements
#[derive(Debug, Clone)]
pub struct SqlMigration {
    name: String,
    timestamp: String,
    up_statements: Vec<String>,
    down_statements: Vec<String>,
}

impl SqlMigration {
    pub fn new(timestamp: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timestamp: timestamp.into(),
            up_statements: Vec::new(),
            down_statements: Vec::new(),
        }
    }

    /// Append a statement to run on `up`
    pub fn up(mut self, sql: impl Into<String>) -> Self {
        self.up_statements.push(sql.into());
        self
    }

    /// Append a statement to run on `down`
    pub fn down(mut self, sql: impl Into<String>) -> Self {
        self.down_statements.push(sql.into());
        self
    }
}

#[async_trait]
impl Migration for SqlMigration {
    fn name(&self) -> &str {
        &self.name
    }

    fn timestamp(&self) -> &str {
        &self.timestamp
    }

    async fn up(&self, conn: &mut dyn DatabaseConnection) -> OrmResult<()> {
        for statement in &self.up_statements {
            conn.execute(statement, &[]).await?;
        }
        Ok(())
    }

    async fn down(&self, conn: &mut dyn DatabaseConnection) -> OrmResult<()> {
        for statement in &self.down_statements {
            conn.execute(statement, &[]).await?;
        }
        Ok(())
    }
}

/// Row of the migration ledger
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationRecord {
    /// Insertion id, defines apply order within a batch
    pub id: i64,
    /// Ledger key, `{timestamp}_{name}`
    pub migration: String,
    /// Batch number
    pub batch: i64,
    /// When the migration was applied
    pub executed_at: Option<DateTime<Utc>>,
}

/// Configuration for the migration system
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Directory where generated migration sources are written
    pub migrations_dir: PathBuf,
    /// Table name for tracking migrations
    pub migrations_table: String,
    /// Tables whose name contains one of these substrings are dropped first by `fresh`
    pub drop_first_patterns: Vec<String>,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            migrations_dir: PathBuf::from("database/migrations"),
            migrations_table: "migrations".to_string(),
            drop_first_patterns: vec!["token".to_string()],
        }
    }
}

impl MigrationConfig {
    pub fn with_migrations_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.migrations_dir = dir.into();
        self
    }

    pub fn with_migrations_table(mut self, table: impl Into<String>) -> Self {
        self.migrations_table = table.into();
        self
    }
}

/// Result of running migrations
#[derive(Debug, Clone, Default)]
pub struct MigrationRunResult {
    /// Batch number assigned to this run, `None` when nothing was pending
    pub batch: Option<i64>,
    /// Keys of migrations that were applied, in apply order
    pub applied_migrations: Vec<String>,
    /// Number of registered migrations that were already applied
    pub skipped_count: usize,
    /// Total execution time in milliseconds
    pub execution_time_ms: u128,
}

impl MigrationRunResult {
    pub fn applied_count(&self) -> usize {
        self.applied_migrations.len()
    }
}

/// Result of rolling back migrations
#[derive(Debug, Clone, Default)]
pub struct RollbackResult {
    /// Batch that was rolled back, `None` when the ledger was empty
    pub batch: Option<i64>,
    /// Keys of migrations that were rolled back, in rollback order
    pub rolled_back_migrations: Vec<String>,
    /// Total execution time in milliseconds
    pub execution_time_ms: u128,
}

impl RollbackResult {
    pub fn rolled_back_count(&self) -> usize {
        self.rolled_back_migrations.len()
    }
}

/// Result of dropping every table and migrating from scratch
#[derive(Debug, Clone, Default)]
pub struct FreshResult {
    /// Tables dropped, in drop order
    pub dropped_tables: Vec<String>,
    /// The migration run that followed
    pub run: MigrationRunResult,
}

/// Migration status in the system
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationStatus {
    /// Migration is pending (not yet applied)
    Pending,
    /// Migration has been applied
    Applied {
        batch: i64,
        executed_at: Option<DateTime<Utc>>,
    },
    /// Ledger entry without a registered migration
    Orphaned {
        batch: i64,
        executed_at: Option<DateTime<Utc>>,
    },
}

/// One line of `migrate:status`
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationStatusEntry {
    pub key: String,
    pub status: MigrationStatus,
}
