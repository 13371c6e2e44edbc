//! Seeder trait and the types reported by the seeder manager

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::backends::DatabaseConnection;
use crate::error::OrmResult;

/// Seeder trait for implementing database seeders
#[async_trait]
pub trait Seeder: Send + Sync {
    /// Get the seeder name for logging and tracking
    fn name(&self) -> &str;

    /// Names of seeders that must run first
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Insert the seed data
    async fn seed(&self, conn: &mut dyn DatabaseConnection) -> OrmResult<()>;

    /// Remove the data created by `seed`. Runs before every reseed, so it
    /// must tolerate the data being absent.
    async fn rollback(&self, _conn: &mut dyn DatabaseConnection) -> OrmResult<()> {
        Ok(())
    }
}

/// Seeder manager configuration
#[derive(Debug, Clone)]
pub struct SeederConfig {
    /// Run seeders even when the audit table records them as executed
    pub force_reseed: bool,
    /// Audit table name
    pub audit_table: String,
}

impl Default for SeederConfig {
    fn default() -> Self {
        Self {
            force_reseed: true,
            audit_table: "seeders".to_string(),
        }
    }
}

impl SeederConfig {
    pub fn with_force_reseed(mut self, force_reseed: bool) -> Self {
        self.force_reseed = force_reseed;
        self
    }

    pub fn with_audit_table(mut self, table: impl Into<String>) -> Self {
        self.audit_table = table.into();
        self
    }
}

/// Outcome of running one or more seeders
#[derive(Debug, Clone, Default)]
pub struct SeederRunResult {
    /// Seeders whose `seed` ran, in execution order. Shared dependencies
    /// appear once per time they were reached.
    pub executed: Vec<String>,
    /// Seeders skipped because the audit table marks them as executed
    pub skipped: Vec<String>,
    pub execution_time_ms: u128,
}

impl SeederRunResult {
    pub(crate) fn merge(&mut self, other: SeederRunResult) {
        self.executed.extend(other.executed);
        self.skipped.extend(other.skipped);
    }
}

/// Outcome of `clean_all_seeder_data`
#[derive(Debug, Clone, Default)]
pub struct CleanResult {
    /// Seeders rolled back, in rollback order
    pub cleaned: Vec<String>,
    /// Seeders whose rollback failed
    pub failed: Vec<String>,
}

/// Audit state of a seeder
#[derive(Debug, Clone, PartialEq)]
pub enum SeederStatus {
    NotExecuted,
    Executed { at: DateTime<Utc> },
    RolledBack { at: DateTime<Utc> },
}

impl SeederStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SeederStatus::NotExecuted => "Not executed",
            SeederStatus::Executed { .. } => "Executed",
            SeederStatus::RolledBack { .. } => "Rolled back",
        }
    }
}

/// One line of `seed:status`
#[derive(Debug, Clone, PartialEq)]
pub struct SeederStatusEntry {
    pub name: String,
    pub status: SeederStatus,
}
