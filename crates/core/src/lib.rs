pub mod config;
pub mod logging;

pub use config::{
    ConfigError, ConfigSource, DatabaseConfig, DatabaseDriver, Environment,
};
pub use logging::{init_logging, LoggingConfig};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get crate version
pub fn version() -> &'static str {
    VERSION
}
