use chrono::Utc;
use strata_codegen::{GenerationOutcome, MigrationGenerator};
use strata_introspect::SchemaInspector;

use crate::context::AppContext;

pub fn migration(ctx: &AppContext, name: &str) -> anyhow::Result<()> {
    let generator = MigrationGenerator::new(ctx.migrations_dir(), ctx.dialect());

    match generator.generate_blank(name, Utc::now())? {
        GenerationOutcome::Created(path) => println!("✅ Created migration: {}", path.display()),
        GenerationOutcome::Skipped(path) => println!("Migration already exists: {}", path.display()),
    }
    Ok(())
}

pub async fn migrations_from_database(ctx: &AppContext) -> anyhow::Result<()> {
    let pool = ctx.pool().await?;
    let dialect = pool.dialect();
    let inspector = SchemaInspector::new(pool.clone())
        .with_migrations_table(ctx.migration_config().migrations_table);

    let tables = inspector.describe_ordered().await;
    pool.close().await?;
    let tables = tables?;

    if tables.is_empty() {
        println!("No tables found");
        return Ok(());
    }

    let generator = MigrationGenerator::new(ctx.migrations_dir(), dialect);
    let report = generator.generate_from_database(&tables, Utc::now());

    for (table, outcome) in &report.outcomes {
        match outcome {
            GenerationOutcome::Created(path) => println!("✅ {}: {}", table, path.display()),
            GenerationOutcome::Skipped(path) => println!("   {}: exists, skipped ({})", table, path.display()),
        }
    }
    for (table, error) in &report.failures {
        println!("❌ {}: {}", table, error);
    }

    println!();
    println!(
        "{} created, {} skipped, {} failed",
        report.created_count(),
        report.skipped_count(),
        report.failures.len()
    );
    Ok(())
}
