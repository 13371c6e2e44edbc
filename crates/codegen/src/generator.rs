use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use strata_introspect::TableInfo;
use strata_orm::SqlDialect;
use tracing::{info, warn};

use crate::error::{CodegenError, CodegenResult};
use crate::naming::{
    format_timestamp, migration_file_name, migration_name, table_name_from_migration, to_pascal_case,
};
use crate::sql::create_table_statements;
use crate::templates::{raw_string_literal, render_template, EXECUTE_STATEMENT, MIGRATION_TEMPLATE, SCAFFOLD_UP};
use crate::writer::{CodeWriter, GenerationOutcome};

/// Per-table results of generating from a live schema
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub outcomes: Vec<(String, GenerationOutcome)>,
    pub failures: Vec<(String, CodegenError)>,
}

impl GenerationReport {
    pub fn created_count(&self) -> usize {
        self.outcomes.iter().filter(|(_, outcome)| outcome.is_created()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.len() - self.created_count()
    }
}

/// Writes migration sources into one directory
pub struct MigrationGenerator {
    migrations_dir: PathBuf,
    dialect: SqlDialect,
    writer: CodeWriter,
}

impl MigrationGenerator {
    pub fn new(migrations_dir: impl Into<PathBuf>, dialect: SqlDialect) -> Self {
        Self {
            migrations_dir: migrations_dir.into(),
            dialect,
            writer: CodeWriter::new(),
        }
    }

    pub fn migrations_dir(&self) -> &Path {
        &self.migrations_dir
    }

    /// Scaffold for a user-named migration: `id` plus timestamp columns
    pub fn generate_blank(&self, name: &str, time: DateTime<Utc>) -> CodegenResult<GenerationOutcome> {
        let name = migration_name(name)?;
        let table = table_name_from_migration(&name);

        let mut up_context = HashMap::new();
        up_context.insert("table", table.clone());
        let up = render_template(SCAFFOLD_UP, &up_context)?;

        self.write_migration(&name, &table, &up, time)
    }

    /// Migration recreating an introspected table
    pub fn generate_for_table(&self, table: &TableInfo, time: DateTime<Utc>) -> CodegenResult<GenerationOutcome> {
        if table.name.is_empty() || !table.name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(CodegenError::InvalidName(table.name.clone()));
        }
        let name = format!("create_{}_table", table.name);

        let statements = create_table_statements(table, self.dialect)
            .iter()
            .map(|sql| {
                let mut context = HashMap::new();
                context.insert("sql", raw_string_literal(sql));
                render_template(EXECUTE_STATEMENT, &context)
            })
            .collect::<CodegenResult<Vec<_>>>()?;

        self.write_migration(&name, &table.name, &statements.join("\n"), time)
    }

    /// One migration per table, in the given order, one minute apart from
    /// `base_time`. A failing table is logged and reported; the rest are
    /// still generated.
    pub fn generate_from_database(&self, tables: &[TableInfo], base_time: DateTime<Utc>) -> GenerationReport {
        let mut report = GenerationReport::default();

        for (i, table) in tables.iter().enumerate() {
            let time = base_time + Duration::minutes(i as i64);
            match self.generate_for_table(table, time) {
                Ok(outcome) => report.outcomes.push((table.name.clone(), outcome)),
                Err(e) => {
                    warn!("Failed to generate migration for {}: {}", table.name, e);
                    report.failures.push((table.name.clone(), e));
                }
            }
        }

        report
    }

    fn write_migration(&self, name: &str, table: &str, up: &str, time: DateTime<Utc>) -> CodegenResult<GenerationOutcome> {
        let timestamp = format_timestamp(time);

        let mut context = HashMap::new();
        context.insert("struct_name", to_pascal_case(name));
        context.insert("name", name.to_string());
        context.insert("timestamp", timestamp.clone());
        context.insert("table", table.to_string());
        context.insert("up", up.to_string());

        let content = render_template(MIGRATION_TEMPLATE, &context)?;
        let path = self.migrations_dir.join(migration_file_name(&timestamp, name));
        let outcome = self.writer.write_if_absent(&path, &content)?;

        match &outcome {
            GenerationOutcome::Created(path) => info!("Created migration: {}", path.display()),
            GenerationOutcome::Skipped(path) => info!("Migration already exists: {}", path.display()),
        }
        Ok(outcome)
    }
}
