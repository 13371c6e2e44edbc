use serial_test::serial;
use strata_core::{DatabaseConfig, DatabaseDriver, Environment};

const DB_VARS: &[&str] = &[
    "DATABASE_URL",
    "DB_DRIVER",
    "DB_HOST",
    "DB_PORT",
    "DB_NAME",
    "DB_USER",
    "DB_PASSWORD",
    "DB_MAX_CONNECTIONS",
    "STRATA_ENV",
    "ENVIRONMENT",
];

fn clear_env() {
    for var in DB_VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_from_env_reads_database_url() {
    clear_env();
    std::env::set_var("DATABASE_URL", "sqlite::memory:");
    std::env::set_var("DB_MAX_CONNECTIONS", "1");

    let config = DatabaseConfig::from_env().unwrap();
    assert_eq!(config.driver, DatabaseDriver::Sqlite);
    assert_eq!(config.max_connections, 1);

    clear_env();
}

#[test]
#[serial]
fn test_from_env_assembles_mysql_url() {
    clear_env();
    std::env::set_var("DB_NAME", "strata_test");
    std::env::set_var("DB_USER", "tester");

    let config = DatabaseConfig::from_env().unwrap();
    assert_eq!(config.driver, DatabaseDriver::MySql);
    assert_eq!(config.url, "mysql://tester@127.0.0.1:3306/strata_test");

    clear_env();
}

#[test]
#[serial]
fn test_environment_from_env() {
    clear_env();
    std::env::set_var("ENVIRONMENT", "production");
    assert_eq!(Environment::from_env().unwrap(), Environment::Production);

    std::env::set_var("STRATA_ENV", "testing");
    assert_eq!(Environment::from_env().unwrap(), Environment::Testing);

    clear_env();
}
