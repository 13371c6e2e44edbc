//! End-to-end migration and seeding runs against in-memory SQLite

use std::sync::Arc;

use strata_orm::{
    async_trait, DatabaseBackend, DatabaseConnection, DatabasePool, DatabasePoolConfig, DatabaseRowExt,
    MigrationConfig, MigrationRegistry, Migrator, OrmResult, Seeder, SeederConfig, SeederManager,
    SeederRegistry, SeederStatus, SqlMigration,
};
use strata_orm::backends::SqliteBackend;

async fn memory_pool() -> Arc<dyn DatabasePool> {
    SqliteBackend::new()
        .create_pool("sqlite::memory:", DatabasePoolConfig::single_connection())
        .await
        .unwrap()
}

fn create_table(timestamp: &str, table: &str, columns: &str) -> SqlMigration {
    SqlMigration::new(timestamp, format!("create_{}_table", table))
        .up(format!("CREATE TABLE {} (id INTEGER PRIMARY KEY AUTOINCREMENT{})", table, columns))
        .down(format!("DROP TABLE IF EXISTS {}", table))
}

async fn count(pool: &Arc<dyn DatabasePool>, table: &str) -> i64 {
    pool.fetch_optional(&format!("SELECT COUNT(*) AS total FROM {}", table), &[])
        .await
        .unwrap()
        .unwrap()
        .get_i64("total")
        .unwrap()
}

async fn table_exists(pool: &Arc<dyn DatabasePool>, table: &str) -> bool {
    pool.fetch_optional(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
        &[table.into()],
    )
    .await
    .unwrap()
    .is_some()
}

#[tokio::test]
async fn second_migrate_applies_nothing() {
    let pool = memory_pool().await;
    let mut registry = MigrationRegistry::new();
    registry.register(create_table("2024_01_01_000001", "users", ", email TEXT")).unwrap();
    registry.register(create_table("2024_01_01_000002", "posts", ", title TEXT")).unwrap();

    let migrator = Migrator::new(pool.clone(), &registry, MigrationConfig::default());
    let first = migrator.migrate().await.unwrap();
    assert_eq!(first.batch, Some(1));
    assert_eq!(first.applied_count(), 2);

    let second = migrator.migrate().await.unwrap();
    assert_eq!(second.batch, None);
    assert_eq!(second.applied_count(), 0);
    assert_eq!(second.skipped_count, 2);

    assert_eq!(count(&pool, "migrations").await, 2);
    assert_eq!(migrator.latest_batch_number().await.unwrap(), 1);
}

#[tokio::test]
async fn rollback_reverts_one_batch_at_a_time() {
    let pool = memory_pool().await;

    let mut batch_one = MigrationRegistry::new();
    batch_one.register(create_table("2024_01_01_000001", "users", "")).unwrap();
    batch_one.register(create_table("2024_01_01_000002", "roles", "")).unwrap();
    Migrator::new(pool.clone(), &batch_one, MigrationConfig::default())
        .migrate()
        .await
        .unwrap();

    let mut all = MigrationRegistry::new();
    all.register(create_table("2024_01_01_000001", "users", "")).unwrap();
    all.register(create_table("2024_01_01_000002", "roles", "")).unwrap();
    all.register(create_table("2024_01_02_000001", "posts", "")).unwrap();

    let migrator = Migrator::new(pool.clone(), &all, MigrationConfig::default());
    assert_eq!(migrator.migrate().await.unwrap().batch, Some(2));

    let first = migrator.rollback().await.unwrap();
    assert_eq!(first.rolled_back_migrations, vec!["2024_01_02_000001_create_posts_table"]);
    assert!(!table_exists(&pool, "posts").await);
    assert!(table_exists(&pool, "users").await);

    let second = migrator.rollback().await.unwrap();
    assert_eq!(
        second.rolled_back_migrations,
        vec!["2024_01_01_000002_create_roles_table", "2024_01_01_000001_create_users_table"]
    );
    assert!(!table_exists(&pool, "users").await);
    assert_eq!(count(&pool, "migrations").await, 0);
}

#[tokio::test]
async fn fresh_drops_everything_and_reapplies() {
    let pool = memory_pool().await;
    let mut registry = MigrationRegistry::new();
    registry.register(create_table("2024_01_01_000001", "users", "")).unwrap();
    registry
        .register(create_table(
            "2024_01_01_000002",
            "password_reset_tokens",
            ", user_id INTEGER REFERENCES users(id)",
        ))
        .unwrap();

    let migrator = Migrator::new(pool.clone(), &registry, MigrationConfig::default());
    migrator.migrate().await.unwrap();
    pool.execute("INSERT INTO users DEFAULT VALUES", &[]).await.unwrap();

    let result = migrator.fresh().await.unwrap();
    assert_eq!(result.dropped_tables.first().map(String::as_str), Some("password_reset_tokens"));
    assert_eq!(result.run.batch, Some(1));
    assert_eq!(count(&pool, "users").await, 0);
    assert_eq!(count(&pool, "migrations").await, 2);
}

struct RolesSeeder;

#[async_trait]
impl Seeder for RolesSeeder {
    fn name(&self) -> &str {
        "roles_seeder"
    }

    async fn seed(&self, conn: &mut dyn DatabaseConnection) -> OrmResult<()> {
        for role in ["admin", "editor"] {
            conn.execute("INSERT INTO roles (name) VALUES (?)", &[role.into()]).await?;
        }
        Ok(())
    }

    async fn rollback(&self, conn: &mut dyn DatabaseConnection) -> OrmResult<()> {
        conn.execute("DELETE FROM roles WHERE name IN ('admin', 'editor')", &[]).await?;
        Ok(())
    }
}

struct UsersSeeder;

#[async_trait]
impl Seeder for UsersSeeder {
    fn name(&self) -> &str {
        "users_seeder"
    }

    fn dependencies(&self) -> Vec<String> {
        vec!["roles_seeder".to_string()]
    }

    async fn seed(&self, conn: &mut dyn DatabaseConnection) -> OrmResult<()> {
        conn.execute(
            "INSERT INTO users (email, role_id) SELECT 'admin@example.com', id FROM roles WHERE name = 'admin'",
            &[],
        )
        .await?;
        Ok(())
    }

    async fn rollback(&self, conn: &mut dyn DatabaseConnection) -> OrmResult<()> {
        conn.execute("DELETE FROM users WHERE email = 'admin@example.com'", &[]).await?;
        Ok(())
    }
}

async fn seeded_schema() -> Arc<dyn DatabasePool> {
    let pool = memory_pool().await;
    let mut registry = MigrationRegistry::new();
    registry.register(create_table("2024_01_01_000001", "roles", ", name TEXT NOT NULL")).unwrap();
    registry
        .register(create_table("2024_01_01_000002", "users", ", email TEXT, role_id INTEGER"))
        .unwrap();
    Migrator::new(pool.clone(), &registry, MigrationConfig::default())
        .migrate()
        .await
        .unwrap();
    pool
}

#[tokio::test]
async fn reseeding_yields_same_data_as_single_run() {
    let pool = seeded_schema().await;
    let mut registry = SeederRegistry::new();
    registry.register(UsersSeeder);
    registry.register(RolesSeeder);

    let manager = SeederManager::new(pool.clone(), &registry, SeederConfig::default());
    manager.run_seeder("users_seeder").await.unwrap();
    manager.run_seeder("users_seeder").await.unwrap();

    assert_eq!(count(&pool, "roles").await, 2);
    assert_eq!(count(&pool, "users").await, 1);

    let row = pool
        .fetch_optional(
            "SELECT r.name AS role FROM users u JOIN roles r ON r.id = u.role_id",
            &[],
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.get_string("role").unwrap(), "admin");
}

#[tokio::test]
async fn seed_all_then_clean() {
    let pool = seeded_schema().await;
    let mut registry = SeederRegistry::new();
    registry.register(UsersSeeder);
    registry.register(RolesSeeder);

    let manager = SeederManager::new(pool.clone(), &registry, SeederConfig::default());
    let run = manager.run_all_seeders().await.unwrap();
    assert_eq!(run.executed, vec!["roles_seeder", "roles_seeder", "users_seeder"]);

    let status = manager.seeder_status().await.unwrap();
    assert!(status.iter().all(|entry| matches!(entry.status, SeederStatus::Executed { .. })));

    let cleaned = manager.clean_all_seeder_data().await.unwrap();
    assert_eq!(cleaned.cleaned, vec!["users_seeder", "roles_seeder"]);
    assert_eq!(count(&pool, "users").await, 0);
    assert_eq!(count(&pool, "roles").await, 0);

    let status = manager.seeder_status().await.unwrap();
    assert!(status.iter().all(|entry| matches!(entry.status, SeederStatus::RolledBack { .. })));
}
