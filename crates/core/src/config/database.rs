//! Database connection settings.
//!
//! `DATABASE_URL` wins when present. Otherwise the URL is assembled from the
//! `DB_DRIVER`, `DB_HOST`, `DB_PORT`, `DB_NAME`, `DB_USER` and `DB_PASSWORD`
//! variables. A `.env` file in the working directory is loaded first.

use crate::config::{
    ConfigError, ConfigSource, ConfigValidator, DatabaseUrlValidator, PortValidator,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Supported database drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    MySql,
    Sqlite,
}

impl DatabaseDriver {
    /// Detect the driver from a connection URL
    pub fn from_url(url: &str) -> Result<Self, ConfigError> {
        if url.starts_with("mysql:") {
            Ok(DatabaseDriver::MySql)
        } else if url.starts_with("sqlite:") {
            Ok(DatabaseDriver::Sqlite)
        } else {
            Err(ConfigError::invalid_value(
                "DATABASE_URL",
                url,
                "a mysql:// or sqlite: URL",
            ))
        }
    }

    pub fn default_port(&self) -> Option<u16> {
        match self {
            DatabaseDriver::MySql => Some(3306),
            DatabaseDriver::Sqlite => None,
        }
    }
}

impl FromStr for DatabaseDriver {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(DatabaseDriver::MySql),
            "sqlite" | "sqlite3" => Ok(DatabaseDriver::Sqlite),
            _ => Err(ConfigError::invalid_value("DB_DRIVER", s, "mysql or sqlite")),
        }
    }
}

impl std::fmt::Display for DatabaseDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseDriver::MySql => write!(f, "mysql"),
            DatabaseDriver::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Resolved database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub driver: DatabaseDriver,
    pub url: String,
    pub max_connections: u32,
    pub source: ConfigSource,
}

impl DatabaseConfig {
    /// Build a configuration from an explicit URL
    pub fn from_url(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        DatabaseUrlValidator::default().validate(&url)?;
        Ok(Self {
            driver: DatabaseDriver::from_url(&url)?,
            url,
            max_connections: 5,
            source: ConfigSource::Programmatic,
        })
    }

    /// Load configuration from the process environment, reading `.env` first
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenv::dotenv() {
            tracing::debug!("No .env file loaded: {}", e);
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw.parse::<u32>().ok().filter(|n| *n > 0).ok_or_else(|| {
                ConfigError::invalid_value("DB_MAX_CONNECTIONS", raw, "a positive integer")
            })?,
            None => 5,
        };

        if let Some(url) = lookup("DATABASE_URL").filter(|u| !u.trim().is_empty()) {
            DatabaseUrlValidator::default().validate(&url)?;
            return Ok(Self {
                driver: DatabaseDriver::from_url(&url)?,
                url,
                max_connections,
                source: ConfigSource::EnvVar("DATABASE_URL".to_string()),
            });
        }

        let driver: DatabaseDriver = lookup("DB_DRIVER")
            .unwrap_or_else(|| "mysql".to_string())
            .parse()?;

        let name = lookup("DB_NAME").filter(|n| !n.is_empty()).ok_or_else(|| {
            ConfigError::missing_required(
                "DB_NAME",
                "Set DB_NAME or provide a full DATABASE_URL",
            )
        })?;

        let url = match driver {
            DatabaseDriver::Sqlite => format!("sqlite://storage/{}.db?mode=rwc", name),
            DatabaseDriver::MySql => {
                let host = lookup("DB_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
                let port = match lookup("DB_PORT") {
                    Some(raw) => {
                        let port = raw.parse::<u16>().map_err(|_| {
                            ConfigError::invalid_value("DB_PORT", raw.clone(), "valid port number")
                        })?;
                        PortValidator::default().validate(&port)?;
                        port
                    }
                    None => 3306,
                };
                let user = lookup("DB_USER").unwrap_or_else(|| "root".to_string());
                let password = lookup("DB_PASSWORD").unwrap_or_default();
                mysql_url(&host, port, &name, &user, &password)?
            }
        };

        Ok(Self {
            driver,
            url,
            max_connections,
            source: ConfigSource::Assembled(
                ["DB_DRIVER", "DB_HOST", "DB_PORT", "DB_NAME", "DB_USER", "DB_PASSWORD"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            ),
        })
    }

    /// Connection URL with the password masked, safe for logs
    pub fn redacted_url(&self) -> String {
        match url::Url::parse(&self.url) {
            Ok(mut parsed) if parsed.password().is_some() => match parsed.set_password(Some("****")) {
                Ok(()) => parsed.to_string(),
                Err(()) => self.url.clone(),
            },
            _ => self.url.clone(),
        }
    }
}

fn mysql_url(host: &str, port: u16, name: &str, user: &str, password: &str) -> Result<String, ConfigError> {
    let mut url = url::Url::parse(&format!("mysql://{}:{}/{}", host, port, name))
        .map_err(|e| ConfigError::invalid_value("DB_HOST", host, format!("valid host ({})", e)))?;
    url.set_username(user)
        .map_err(|_| ConfigError::invalid_value("DB_USER", user, "valid user name"))?;
    if !password.is_empty() {
        url.set_password(Some(password))
            .map_err(|_| ConfigError::invalid_value("DB_PASSWORD", "****", "valid password"))?;
    }
    Ok(url.to_string())
}
