//! Logging setup for the command binary.

use crate::config::{ConfigError, Environment};
use std::io;
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "warn")
    pub level: String,
    /// Enable JSON structured logging (vs plain text)
    pub json_format: bool,
    /// Include the event target (module path)
    pub include_target: bool,
    /// Include timestamp in logs
    pub include_timestamp: bool,
    /// Environment filter, e.g. "strata_orm=debug,sqlx=warn"
    pub env_filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_target: false,
            include_timestamp: true,
            env_filter: None,
        }
    }
}

impl LoggingConfig {
    /// Logging defaults for an environment. Production logs JSON.
    pub fn for_environment(env: Environment) -> Self {
        Self {
            level: env.log_level().to_string(),
            json_format: env.is_production(),
            include_target: false,
            include_timestamp: true,
            env_filter: Some(format!("{},sqlx=warn", env.log_level())),
        }
    }

    /// Raise verbosity to debug for the engine crates
    pub fn verbose(mut self) -> Self {
        self.level = "debug".to_string();
        self.include_target = true;
        self.env_filter = Some("debug,sqlx=info".to_string());
        self
    }

    /// Set environment filter
    pub fn with_env_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Filter directive used when `RUST_LOG` is not set
    pub fn directive(&self) -> &str {
        self.env_filter.as_deref().unwrap_or(&self.level)
    }
}

/// Initialize logging. `RUST_LOG` takes precedence over the configured filter.
pub fn init_logging(config: LoggingConfig) -> Result<(), ConfigError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.directive()))
        .map_err(|e| ConfigError::Logging {
            message: e.to_string(),
        })?;

    let result = if config.json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                Layer::new()
                    .with_writer(io::stderr)
                    .with_target(config.include_target)
                    .json(),
            )
            .try_init()
    } else if config.include_timestamp {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                Layer::new()
                    .with_writer(io::stderr)
                    .with_target(config.include_target),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                Layer::new()
                    .with_writer(io::stderr)
                    .with_target(config.include_target)
                    .without_time(),
            )
            .try_init()
    };

    result.map_err(|e| ConfigError::Logging {
        message: e.to_string(),
    })
}
