use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use strata_core::{DatabaseConfig, DatabaseDriver, Environment};
use strata_orm::{create_pool, DatabasePool, MigrationConfig, SqlDialect};

/// Settings shared by every command of one invocation
pub struct AppContext {
    pub environment: Environment,
    database_url: Option<String>,
    migrations_dir: PathBuf,
}

impl AppContext {
    pub fn new(environment: Environment, database_url: Option<String>, migrations_dir: PathBuf) -> Self {
        Self {
            environment,
            database_url,
            migrations_dir,
        }
    }

    pub fn migrations_dir(&self) -> &Path {
        &self.migrations_dir
    }

    /// `--database-url` first, then the process environment
    pub fn database_config(&self) -> anyhow::Result<DatabaseConfig> {
        let config = match &self.database_url {
            Some(url) => DatabaseConfig::from_url(url.clone())?,
            None => DatabaseConfig::from_env()?,
        };
        Ok(config)
    }

    pub async fn pool(&self) -> anyhow::Result<Arc<dyn DatabasePool>> {
        let config = self.database_config()?;
        println!("Connection: {} ({})", config.redacted_url(), self.environment);

        create_pool(&config)
            .await
            .with_context(|| format!("Failed to connect to {}", config.redacted_url()))
    }

    pub fn migration_config(&self) -> MigrationConfig {
        MigrationConfig::default().with_migrations_dir(self.migrations_dir.clone())
    }

    /// Dialect of the configured database, MySQL when none is configured
    pub fn dialect(&self) -> SqlDialect {
        match self.database_config() {
            Ok(config) => match config.driver {
                DatabaseDriver::MySql => SqlDialect::MySQL,
                DatabaseDriver::Sqlite => SqlDialect::SQLite,
            },
            Err(e) => {
                tracing::debug!("No database configured ({}), assuming mysql", e);
                SqlDialect::MySQL
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_database_url_flag_wins() {
        std::env::set_var("DATABASE_URL", "mysql://root@localhost:3306/app");
        let ctx = AppContext::new(
            Environment::Testing,
            Some("sqlite://storage/app.db?mode=rwc".to_string()),
            PathBuf::from("database/migrations"),
        );

        let config = ctx.database_config().unwrap();
        assert_eq!(config.url, "sqlite://storage/app.db?mode=rwc");
        assert_eq!(ctx.dialect(), SqlDialect::SQLite);
        std::env::remove_var("DATABASE_URL");
    }

    #[test]
    #[serial]
    fn test_environment_url_used_without_flag() {
        std::env::set_var("DATABASE_URL", "mysql://root@localhost:3306/app");
        let ctx = AppContext::new(Environment::Testing, None, PathBuf::from("migrations"));

        assert_eq!(ctx.dialect(), SqlDialect::MySQL);
        assert_eq!(ctx.migration_config().migrations_dir, PathBuf::from("migrations"));
        std::env::remove_var("DATABASE_URL");
    }
}
