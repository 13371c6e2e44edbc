use strata_orm::{SeederConfig, SeederManager, SeederRunResult, SeederStatus};

use super::DISPLAY_TIME_FORMAT;
use crate::context::AppContext;
use crate::database::seeders;

fn print_run(result: &SeederRunResult) {
    for name in &result.executed {
        println!("   Seeded: {}", name);
    }
    for name in &result.skipped {
        println!("   Skipped (already executed): {}", name);
    }
    println!(
        "✅ {} seeder run(s) completed ({} ms)",
        result.executed.len(),
        result.execution_time_ms
    );
}

pub async fn run_all(ctx: &AppContext) -> anyhow::Result<()> {
    let pool = ctx.pool().await?;
    let registry = seeders::registry();
    let manager = SeederManager::new(pool.clone(), &registry, SeederConfig::default());

    let result = manager.run_all_seeders().await;
    pool.close().await?;
    print_run(&result?);
    Ok(())
}

pub async fn run(ctx: &AppContext, name: &str) -> anyhow::Result<()> {
    let pool = ctx.pool().await?;
    let registry = seeders::registry();
    let manager = SeederManager::new(pool.clone(), &registry, SeederConfig::default());

    let result = manager.run_seeder(name).await;
    pool.close().await?;
    print_run(&result?);
    Ok(())
}

pub async fn rollback(ctx: &AppContext, name: &str) -> anyhow::Result<()> {
    let pool = ctx.pool().await?;
    let registry = seeders::registry();
    let manager = SeederManager::new(pool.clone(), &registry, SeederConfig::default());

    let result = manager.rollback_seeder(name).await;
    pool.close().await?;
    result?;

    println!("✅ Rolled back seeder: {}", name);
    Ok(())
}

pub async fn reset(ctx: &AppContext, name: &str) -> anyhow::Result<()> {
    let pool = ctx.pool().await?;
    let registry = seeders::registry();
    let manager = SeederManager::new(pool.clone(), &registry, SeederConfig::default());

    let result = manager.reset_seeder(name).await;
    pool.close().await?;
    print_run(&result?);
    Ok(())
}

pub async fn status(ctx: &AppContext) -> anyhow::Result<()> {
    let pool = ctx.pool().await?;
    let registry = seeders::registry();
    let manager = SeederManager::new(pool.clone(), &registry, SeederConfig::default());

    let entries = manager.seeder_status().await;
    pool.close().await?;
    let entries = entries?;

    println!("{:<30} {:<14} At", "Seeder", "Status");
    for entry in &entries {
        let at = match &entry.status {
            SeederStatus::NotExecuted => String::new(),
            SeederStatus::Executed { at } | SeederStatus::RolledBack { at } => {
                at.format(DISPLAY_TIME_FORMAT).to_string()
            }
        };
        println!("{:<30} {:<14} {}", entry.name, entry.status.label(), at);
    }
    Ok(())
}

pub async fn clean(ctx: &AppContext) -> anyhow::Result<()> {
    let pool = ctx.pool().await?;
    let registry = seeders::registry();
    let manager = SeederManager::new(pool.clone(), &registry, SeederConfig::default());

    let result = manager.clean_all_seeder_data().await;
    pool.close().await?;
    let result = result?;

    for name in &result.cleaned {
        println!("   Cleaned: {}", name);
    }
    for name in &result.failed {
        println!("❌ Failed to clean: {}", name);
    }
    println!(
        "✅ {} seeder(s) cleaned, {} failed",
        result.cleaned.len(),
        result.failed.len()
    );
    Ok(())
}
