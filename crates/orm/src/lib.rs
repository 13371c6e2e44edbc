//! # strata-orm: Database Layer for strata
//!
//! MySQL and SQLite backends behind object-safe traits, versioned
//! migrations tracked in a ledger table, and dependency-aware seeders
//! tracked in an audit table.

pub mod backends;
pub mod error;
pub mod migrations;
pub mod seeding;

pub use backends::{
    connect, create_pool, DatabaseBackend, DatabaseBackendType, DatabaseConnection, DatabasePool,
    DatabasePoolConfig, DatabaseRow, DatabaseRowExt, DatabaseTransaction, DatabaseValue, SqlDialect,
};
pub use error::{OrmError, OrmResult};
pub use migrations::{
    Migration, MigrationConfig, MigrationRegistry, MigrationRunResult, MigrationStatus, MigrationStatusEntry,
    Migrator, RollbackResult, SqlMigration,
};
pub use seeding::{
    CleanResult, Seeder, SeederConfig, SeederManager, SeederRegistry, SeederRunResult, SeederStatus,
    SeederStatusEntry,
};

// Re-exported so migration and seeder sources only need this crate
pub use async_trait::async_trait;
