use std::fs;

use chrono::{TimeZone, Utc};
use strata_codegen::{GenerationOutcome, MigrationGenerator};
use strata_introspect::SchemaInspector;
use strata_orm::backends::SqliteBackend;
use strata_orm::{DatabaseBackend, DatabasePool, DatabasePoolConfig, SqlDialect};
use tempfile::TempDir;

#[test]
fn blank_migration_is_written_once() {
    let dir = TempDir::new().unwrap();
    let generator = MigrationGenerator::new(dir.path().join("migrations"), SqlDialect::SQLite);
    let time = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

    let first = generator.generate_blank("CreateFlightsTable", time).unwrap();
    assert!(first.is_created());
    assert_eq!(
        first.path().file_name().unwrap().to_str().unwrap(),
        "2024_03_09_140507_create_flights_table.rs"
    );

    let source = fs::read_to_string(first.path()).unwrap();
    assert!(source.contains("pub struct CreateFlightsTable;"));
    assert!(source.contains("\"2024_03_09_140507\""));
    assert!(source.contains("CREATE TABLE flights ("));
    assert!(source.contains("DROP TABLE IF EXISTS flights"));

    let second = generator.generate_blank("create_flights_table", time).unwrap();
    assert!(matches!(second, GenerationOutcome::Skipped(_)));
    assert_eq!(fs::read_to_string(second.path()).unwrap(), source);
}

#[test]
fn invalid_names_are_rejected() {
    let dir = TempDir::new().unwrap();
    let generator = MigrationGenerator::new(dir.path(), SqlDialect::MySQL);

    assert!(generator.generate_blank("9lives", Utc::now()).is_err());
    assert!(generator.generate_blank("", Utc::now()).is_err());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn generates_from_live_schema_in_dependency_order() {
    let pool = SqliteBackend::new()
        .create_pool("sqlite::memory:", DatabasePoolConfig::single_connection())
        .await
        .unwrap();
    for sql in [
        "CREATE TABLE comments (id INTEGER PRIMARY KEY AUTOINCREMENT, post_id INTEGER NOT NULL, body TEXT, FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE)",
        "CREATE TABLE posts (id INTEGER PRIMARY KEY AUTOINCREMENT, title VARCHAR(255) NOT NULL)",
        "CREATE INDEX posts_title_index ON posts (title)",
    ] {
        pool.execute(sql, &[]).await.unwrap();
    }

    let tables = SchemaInspector::new(pool).describe_ordered().await.unwrap();
    let dir = TempDir::new().unwrap();
    let generator = MigrationGenerator::new(dir.path(), SqlDialect::SQLite);
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    let report = generator.generate_from_database(&tables, base);
    assert!(report.failures.is_empty());
    assert_eq!(report.created_count(), 2);

    let names: Vec<_> = report
        .outcomes
        .iter()
        .map(|(_, outcome)| outcome.path().file_name().unwrap().to_str().unwrap().to_string())
        .collect();
    assert_eq!(
        names,
        vec![
            "2024_01_01_000000_create_posts_table.rs",
            "2024_01_01_000100_create_comments_table.rs",
        ]
    );

    let posts = fs::read_to_string(dir.path().join(&names[0])).unwrap();
    assert!(posts.contains("pub struct CreatePostsTable;"));
    assert!(posts.contains("id INTEGER PRIMARY KEY AUTOINCREMENT"));
    assert!(posts.contains("CREATE INDEX posts_title_index ON posts (title)"));

    let comments = fs::read_to_string(dir.path().join(&names[1])).unwrap();
    assert!(comments.contains(
        "CONSTRAINT comments_post_id_foreign FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE"
    ));

    let rerun = generator.generate_from_database(&tables, base);
    assert_eq!(rerun.created_count(), 0);
    assert_eq!(rerun.skipped_count(), 2);
}

#[tokio::test]
async fn defaults_containing_braces_are_kept_verbatim() {
    let pool = SqliteBackend::new()
        .create_pool("sqlite::memory:", DatabasePoolConfig::single_connection())
        .await
        .unwrap();
    pool.execute(
        "CREATE TABLE settings (id INTEGER PRIMARY KEY AUTOINCREMENT, tpl TEXT DEFAULT '{{name}}')",
        &[],
    )
    .await
    .unwrap();

    let settings = SchemaInspector::new(pool).describe_table("settings").await.unwrap();
    let dir = TempDir::new().unwrap();
    let generator = MigrationGenerator::new(dir.path(), SqlDialect::SQLite);
    let time = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    let outcome = generator.generate_for_table(&settings, time).unwrap();
    let source = fs::read_to_string(outcome.path()).unwrap();
    assert!(source.contains("{{name}}"));
    assert!(source.contains("\"create_settings_table\""));
}
