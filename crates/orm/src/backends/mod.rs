//! Database Backend Abstractions
//!
//! MySQL and SQLite implementations behind common traits.

pub mod core;
pub mod mysql;
pub mod sqlite;

use std::sync::Arc;

use strata_core::{DatabaseConfig, DatabaseDriver};

pub use self::core::*;
pub use mysql::MySqlBackend;
pub use sqlite::SqliteBackend;

use crate::error::{OrmError, OrmResult};

/// Database backend type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseBackendType {
    MySQL,
    SQLite,
}

impl DatabaseBackendType {
    /// Detect database backend type from URL
    pub fn from_url(url: &str) -> OrmResult<Self> {
        if url.starts_with("mysql://") {
            Ok(DatabaseBackendType::MySQL)
        } else if url.starts_with("sqlite:") {
            Ok(DatabaseBackendType::SQLite)
        } else {
            Err(OrmError::Connection(format!(
                "Unable to detect database backend from URL: {}",
                url
            )))
        }
    }

    pub fn backend(&self) -> Arc<dyn DatabaseBackend> {
        match self {
            DatabaseBackendType::MySQL => Arc::new(MySqlBackend::new()),
            DatabaseBackendType::SQLite => Arc::new(SqliteBackend::new()),
        }
    }
}

impl From<DatabaseDriver> for DatabaseBackendType {
    fn from(driver: DatabaseDriver) -> Self {
        match driver {
            DatabaseDriver::MySql => DatabaseBackendType::MySQL,
            DatabaseDriver::Sqlite => DatabaseBackendType::SQLite,
        }
    }
}

impl std::fmt::Display for DatabaseBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseBackendType::MySQL => write!(f, "mysql"),
            DatabaseBackendType::SQLite => write!(f, "sqlite"),
        }
    }
}

/// Open a pool for a raw connection URL
pub async fn connect(database_url: &str, config: DatabasePoolConfig) -> OrmResult<Arc<dyn DatabasePool>> {
    let backend_type = DatabaseBackendType::from_url(database_url)?;
    tracing::debug!("Opening {} connection pool", backend_type);
    backend_type.backend().create_pool(database_url, config).await
}

/// Open a pool described by the resolved database configuration
pub async fn create_pool(config: &DatabaseConfig) -> OrmResult<Arc<dyn DatabasePool>> {
    let backend_type = DatabaseBackendType::from(config.driver);
    let pool_config = DatabasePoolConfig::default().with_max_connections(config.max_connections);

    tracing::debug!("Connecting to {}", config.redacted_url());
    backend_type.backend().create_pool(&config.url, pool_config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_detection() {
        assert_eq!(
            DatabaseBackendType::from_url("mysql://root@localhost/app").unwrap(),
            DatabaseBackendType::MySQL
        );
        assert_eq!(
            DatabaseBackendType::from_url("sqlite::memory:").unwrap(),
            DatabaseBackendType::SQLite
        );
        assert!(DatabaseBackendType::from_url("postgres://localhost/app").is_err());
    }

    #[test]
    fn test_backend_dialects() {
        assert_eq!(DatabaseBackendType::MySQL.backend().sql_dialect(), SqlDialect::MySQL);
        assert_eq!(DatabaseBackendType::SQLite.backend().sql_dialect(), SqlDialect::SQLite);
    }
}
