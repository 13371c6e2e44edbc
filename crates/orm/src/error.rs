//! Error types for the database layer, migrations and seeders.

use thiserror::Error;

/// Result type alias for database operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for ORM operations
#[derive(Debug, Error)]
pub enum OrmError {
    /// Database driver error
    #[error("Database error: {0}")]
    Database(String),

    /// Statement failed to execute or decode
    #[error("Query error: {0}")]
    Query(String),

    /// Connection pool error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Transaction error
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Two registered migrations resolve to the same ledger key
    #[error("Duplicate migration '{key}' registered")]
    DuplicateMigration { key: String },

    /// Ledger entry with no registered migration
    #[error("Migration '{key}' is recorded in the ledger but not registered")]
    UnknownMigration { key: String },

    #[error("Migration '{migration}' failed: {source}")]
    MigrationFailed {
        migration: String,
        #[source]
        source: Box<OrmError>,
    },

    #[error("Rollback of migration '{migration}' failed: {source}")]
    RollbackFailed {
        migration: String,
        #[source]
        source: Box<OrmError>,
    },

    #[error("Seeder '{0}' not found")]
    SeederNotFound(String),

    #[error("Seeder '{seeder}' failed: {source}")]
    SeederFailed {
        seeder: String,
        #[source]
        source: Box<OrmError>,
    },

    #[error("Dependency '{dependency}' of seeder '{seeder}' failed: {source}")]
    SeederDependency {
        seeder: String,
        dependency: String,
        #[source]
        source: Box<OrmError>,
    },

    /// Dependency graph contains a cycle
    #[error("Circular dependency detected: {}", .path.join(" -> "))]
    CircularDependency { path: Vec<String> },
}

impl OrmError {
    pub fn migration_failed(migration: impl Into<String>, source: OrmError) -> Self {
        Self::MigrationFailed {
            migration: migration.into(),
            source: Box::new(source),
        }
    }

    pub fn rollback_failed(migration: impl Into<String>, source: OrmError) -> Self {
        Self::RollbackFailed {
            migration: migration.into(),
            source: Box::new(source),
        }
    }

    pub fn seeder_failed(seeder: impl Into<String>, source: OrmError) -> Self {
        Self::SeederFailed {
            seeder: seeder.into(),
            source: Box::new(source),
        }
    }

    /// Whether this error comes from registry wiring rather than the database
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            OrmError::Configuration(_)
                | OrmError::DuplicateMigration { .. }
                | OrmError::UnknownMigration { .. }
                | OrmError::SeederNotFound(_)
                | OrmError::CircularDependency { .. }
        )
    }
}

impl From<sqlx::Error> for OrmError {
    fn from(err: sqlx::Error) -> Self {
        OrmError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_lists_path() {
        let err = OrmError::CircularDependency {
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "Circular dependency detected: a -> b -> a");
        assert!(err.is_configuration());
    }

    #[test]
    fn test_wrapped_error_keeps_cause() {
        let err = OrmError::migration_failed(
            "2024_01_01_000001_create_users_table",
            OrmError::Query("table users already exists".into()),
        );
        assert!(err.to_string().contains("table users already exists"));
        assert!(!err.is_configuration());
    }
}
