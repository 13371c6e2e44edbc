mod commands;
mod context;
mod database;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use strata_core::{init_logging, Environment, LoggingConfig};

use commands::{make, migrate, seed};
use context::AppContext;

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Schema migrations and data seeding")]
#[command(version)]
struct Cli {
    /// Environment (development, testing, production); defaults to STRATA_ENV
    #[arg(long, global = true)]
    env: Option<String>,

    /// Connection URL, overrides DATABASE_URL and the DB_* variables
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Directory generated migration sources are written to
    #[arg(long, global = true, default_value = "database/migrations")]
    migrations_dir: PathBuf,

    /// Debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply every pending migration as one new batch
    #[command(name = "migrate")]
    Migrate,

    /// DESTRUCTIVE: drop every table in the database, then run all migrations
    #[command(name = "migrate:fresh")]
    MigrateFresh {
        /// Allow running in production
        #[arg(long)]
        force: bool,
    },

    /// Revert the most recent batch of migrations
    #[command(name = "migrate:rollback")]
    MigrateRollback,

    /// Show which migrations are applied and which are pending
    #[command(name = "migrate:status")]
    MigrateStatus,

    /// Create a new migration source file
    #[command(name = "make:migration")]
    MakeMigration {
        /// Migration name, e.g. create_flights_table
        name: String,
    },

    /// Create one migration per table of the connected database
    ///
    /// File timestamps start at the current time, so running this again
    /// writes a new set of files rather than skipping the earlier ones.
    #[command(name = "make:migration-from-db")]
    MakeMigrationFromDb,

    /// Run every registered seeder, dependencies first
    #[command(name = "db:seed")]
    DbSeed,

    /// Run one seeder and its dependencies
    #[command(name = "run:seed")]
    RunSeed {
        /// Seeder name, e.g. users_seeder
        name: String,
    },

    /// Remove the data a seeder created
    #[command(name = "seed:rollback")]
    SeedRollback {
        name: String,
    },

    /// Roll back and rerun a seeder
    #[command(name = "seed:reset")]
    SeedReset {
        name: String,
    },

    /// Show the audit state of every seeder
    #[command(name = "seed:status")]
    SeedStatus,

    /// Roll back every seeder, dependents first
    #[command(name = "seed:clean")]
    SeedClean,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let environment = match cli.env.as_deref() {
        Some(env) => env.parse::<Environment>()?,
        None => Environment::from_env()?,
    };

    let mut logging = LoggingConfig::for_environment(environment);
    if cli.verbose {
        logging = logging.verbose();
    }
    init_logging(logging)?;

    let ctx = AppContext::new(environment, cli.database_url, cli.migrations_dir);

    match cli.command {
        Commands::Migrate => migrate::run(&ctx).await?,
        Commands::MigrateFresh { force } => migrate::fresh(&ctx, force).await?,
        Commands::MigrateRollback => migrate::rollback(&ctx).await?,
        Commands::MigrateStatus => migrate::status(&ctx).await?,
        Commands::MakeMigration { name } => make::migration(&ctx, &name)?,
        Commands::MakeMigrationFromDb => make::migrations_from_database(&ctx).await?,
        Commands::DbSeed => seed::run_all(&ctx).await?,
        Commands::RunSeed { name } => seed::run(&ctx, &name).await?,
        Commands::SeedRollback { name } => seed::rollback(&ctx, &name).await?,
        Commands::SeedReset { name } => seed::reset(&ctx, &name).await?,
        Commands::SeedStatus => seed::status(&ctx).await?,
        Commands::SeedClean => seed::clean(&ctx).await?,
    }

    Ok(())
}
