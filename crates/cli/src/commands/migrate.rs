use anyhow::bail;
use strata_orm::{MigrationStatus, Migrator};

use super::DISPLAY_TIME_FORMAT;
use crate::context::AppContext;
use crate::database::migrations;

pub async fn run(ctx: &AppContext) -> anyhow::Result<()> {
    let pool = ctx.pool().await?;
    let registry = migrations::registry()?;
    let migrator = Migrator::new(pool.clone(), &registry, ctx.migration_config());

    let result = migrator.migrate().await;
    pool.close().await?;
    let result = result?;

    match result.batch {
        Some(batch) => println!(
            "✅ Applied {} migration(s) in batch {} ({} ms)",
            result.applied_count(),
            batch,
            result.execution_time_ms
        ),
        None => println!("Nothing to migrate"),
    }
    Ok(())
}

pub async fn fresh(ctx: &AppContext, force: bool) -> anyhow::Result<()> {
    if ctx.environment.is_production() && !force {
        bail!("migrate:fresh drops every table; pass --force to run it in production");
    }

    let pool = ctx.pool().await?;
    let registry = migrations::registry()?;
    let migrator = Migrator::new(pool.clone(), &registry, ctx.migration_config());

    let result = migrator.fresh().await;
    pool.close().await?;
    let result = result?;

    println!("Dropped {} table(s)", result.dropped_tables.len());
    println!(
        "✅ Applied {} migration(s) ({} ms)",
        result.run.applied_count(),
        result.run.execution_time_ms
    );
    Ok(())
}

pub async fn rollback(ctx: &AppContext) -> anyhow::Result<()> {
    let pool = ctx.pool().await?;
    let registry = migrations::registry()?;
    let migrator = Migrator::new(pool.clone(), &registry, ctx.migration_config());

    let result = migrator.rollback().await;
    pool.close().await?;
    let result = result?;

    match result.batch {
        Some(batch) => println!(
            "✅ Rolled back {} migration(s) from batch {} ({} ms)",
            result.rolled_back_count(),
            batch,
            result.execution_time_ms
        ),
        None => println!("Nothing to rollback"),
    }
    Ok(())
}

pub async fn status(ctx: &AppContext) -> anyhow::Result<()> {
    let pool = ctx.pool().await?;
    let registry = migrations::registry()?;
    let migrator = Migrator::new(pool.clone(), &registry, ctx.migration_config());

    let entries = migrator.status().await;
    pool.close().await?;
    let entries = entries?;

    if entries.is_empty() {
        println!("No migrations found");
        return Ok(());
    }

    println!("{:<9} {:<6} {:<20} Migration", "Status", "Batch", "Executed at");
    for entry in &entries {
        let (label, batch, executed_at) = match &entry.status {
            MigrationStatus::Pending => ("Pending", String::new(), String::new()),
            MigrationStatus::Applied { batch, executed_at } => ("Applied", batch.to_string(), format_time(executed_at)),
            MigrationStatus::Orphaned { batch, executed_at } => ("Orphaned", batch.to_string(), format_time(executed_at)),
        };
        println!("{:<9} {:<6} {:<20} {}", label, batch, executed_at, entry.key);
    }

    let pending = entries
        .iter()
        .filter(|e| matches!(e.status, MigrationStatus::Pending))
        .count();
    println!();
    println!("{} migration(s), {} pending", entries.len(), pending);
    Ok(())
}

fn format_time(time: &Option<chrono::DateTime<chrono::Utc>>) -> String {
    time.map(|t| t.format(DISPLAY_TIME_FORMAT).to_string())
        .unwrap_or_default()
}
