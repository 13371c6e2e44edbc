use strata_orm::{async_trait, DatabaseConnection, OrmResult, Seeder, SeederRegistry};

/// Hash of the literal `password`, for local accounts only
const DEFAULT_PASSWORD_HASH: &str = "$2y$10$92IXUNpkjO0rOQ5byMi.Ye4oKoEa3Ro9llC/.og/at2.uheWG/igi";

const ROLES: &[(&str, &str)] = &[
    ("admin", "Full access"),
    ("editor", "Manages every post"),
    ("author", "Writes own posts"),
];

const PERMISSIONS: &[(&str, &str)] = &[
    ("posts.create", "Create posts"),
    ("posts.edit", "Edit posts"),
    ("posts.delete", "Delete posts"),
    ("users.manage", "Manage users and roles"),
];

const ROLE_PERMISSIONS: &[(&str, &str)] = &[
    ("admin", "posts.create"),
    ("admin", "posts.edit"),
    ("admin", "posts.delete"),
    ("admin", "users.manage"),
    ("editor", "posts.create"),
    ("editor", "posts.edit"),
    ("editor", "posts.delete"),
    ("author", "posts.create"),
];

const USERS: &[(&str, &str, &str)] = &[
    ("Administrator", "admin@example.com", "admin"),
    ("Editor", "editor@example.com", "editor"),
    ("Author", "author@example.com", "author"),
];

const CATEGORIES: &[(&str, &str)] = &[
    ("News", "news"),
    ("Tutorials", "tutorials"),
    ("Releases", "releases"),
];

const POSTS: &[(&str, &str, &str, &str)] = &[
    ("Welcome", "welcome", "admin@example.com", "news"),
    ("Getting started", "getting-started", "author@example.com", "tutorials"),
    ("Version 1.0", "version-1-0", "editor@example.com", "releases"),
];

pub struct RolesPermissionsSeeder;

#[async_trait]
impl Seeder for RolesPermissionsSeeder {
    fn name(&self) -> &str {
        "roles_permissions_seeder"
    }

    async fn seed(&self, conn: &mut dyn DatabaseConnection) -> OrmResult<()> {
        for (name, description) in ROLES {
            conn.execute(
                "INSERT INTO roles (name, description) VALUES (?, ?)",
                &[(*name).into(), (*description).into()],
            )
            .await?;
        }
        for (name, description) in PERMISSIONS {
            conn.execute(
                "INSERT INTO permissions (name, description) VALUES (?, ?)",
                &[(*name).into(), (*description).into()],
            )
            .await?;
        }
        for (role, permission) in ROLE_PERMISSIONS {
            conn.execute(
                "INSERT INTO role_permissions (role_id, permission_id) \
                 SELECT r.id, p.id FROM roles r, permissions p WHERE r.name = ? AND p.name = ?",
                &[(*role).into(), (*permission).into()],
            )
            .await?;
        }
        Ok(())
    }

    async fn rollback(&self, conn: &mut dyn DatabaseConnection) -> OrmResult<()> {
        for (role, _) in ROLES {
            conn.execute(
                "DELETE FROM role_permissions WHERE role_id IN (SELECT id FROM roles WHERE name = ?)",
                &[(*role).into()],
            )
            .await?;
            conn.execute(
                "DELETE FROM user_roles WHERE role_id IN (SELECT id FROM roles WHERE name = ?)",
                &[(*role).into()],
            )
            .await?;
            conn.execute("DELETE FROM roles WHERE name = ?", &[(*role).into()]).await?;
        }
        for (permission, _) in PERMISSIONS {
            conn.execute("DELETE FROM permissions WHERE name = ?", &[(*permission).into()])
                .await?;
        }
        Ok(())
    }
}

pub struct CategoriesSeeder;

#[async_trait]
impl Seeder for CategoriesSeeder {
    fn name(&self) -> &str {
        "categories_seeder"
    }

    async fn seed(&self, conn: &mut dyn DatabaseConnection) -> OrmResult<()> {
        for (name, slug) in CATEGORIES {
            conn.execute(
                "INSERT INTO categories (name, slug) VALUES (?, ?)",
                &[(*name).into(), (*slug).into()],
            )
            .await?;
        }
        Ok(())
    }

    async fn rollback(&self, conn: &mut dyn DatabaseConnection) -> OrmResult<()> {
        for (_, slug) in CATEGORIES {
            conn.execute("DELETE FROM categories WHERE slug = ?", &[(*slug).into()])
                .await?;
        }
        Ok(())
    }
}

pub struct UsersSeeder;

#[async_trait]
impl Seeder for UsersSeeder {
    fn name(&self) -> &str {
        "users_seeder"
    }

    fn dependencies(&self) -> Vec<String> {
        vec!["roles_permissions_seeder".to_string()]
    }

    async fn seed(&self, conn: &mut dyn DatabaseConnection) -> OrmResult<()> {
        for (name, email, role) in USERS {
            conn.execute(
                "INSERT INTO users (name, email, password) VALUES (?, ?, ?)",
                &[(*name).into(), (*email).into(), DEFAULT_PASSWORD_HASH.into()],
            )
            .await?;
            conn.execute(
                "INSERT INTO user_roles (user_id, role_id) \
                 SELECT u.id, r.id FROM users u, roles r WHERE u.email = ? AND r.name = ?",
                &[(*email).into(), (*role).into()],
            )
            .await?;
        }
        Ok(())
    }

    async fn rollback(&self, conn: &mut dyn DatabaseConnection) -> OrmResult<()> {
        for (_, email, _) in USERS {
            conn.execute(
                "DELETE FROM posts WHERE user_id IN (SELECT id FROM users WHERE email = ?)",
                &[(*email).into()],
            )
            .await?;
            conn.execute(
                "DELETE FROM user_roles WHERE user_id IN (SELECT id FROM users WHERE email = ?)",
                &[(*email).into()],
            )
            .await?;
            conn.execute("DELETE FROM users WHERE email = ?", &[(*email).into()])
                .await?;
        }
        Ok(())
    }
}

pub struct PostsSeeder;

#[async_trait]
impl Seeder for PostsSeeder {
    fn name(&self) -> &str {
        "posts_seeder"
    }

    fn dependencies(&self) -> Vec<String> {
        vec!["users_seeder".to_string(), "categories_seeder".to_string()]
    }

    async fn seed(&self, conn: &mut dyn DatabaseConnection) -> OrmResult<()> {
        for (title, slug, author, category) in POSTS {
            conn.execute(
                "INSERT INTO posts (user_id, category_id, title, slug, body) \
                 SELECT u.id, c.id, ?, ?, ? FROM users u, categories c WHERE u.email = ? AND c.slug = ?",
                &[
                    (*title).into(),
                    (*slug).into(),
                    format!("{} body", title).into(),
                    (*author).into(),
                    (*category).into(),
                ],
            )
            .await?;
        }
        Ok(())
    }

    async fn rollback(&self, conn: &mut dyn DatabaseConnection) -> OrmResult<()> {
        for (_, slug, _, _) in POSTS {
            conn.execute("DELETE FROM posts WHERE slug = ?", &[(*slug).into()]).await?;
        }
        Ok(())
    }
}

/// Every application seeder
pub fn registry() -> SeederRegistry {
    let mut registry = SeederRegistry::new();
    registry.register(RolesPermissionsSeeder);
    registry.register(CategoriesSeeder);
    registry.register(UsersSeeder);
    registry.register(PostsSeeder);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use strata_orm::backends::SqliteBackend;
    use strata_orm::{
        DatabaseBackend, DatabasePool, DatabasePoolConfig, DatabaseRowExt, MigrationConfig, Migrator,
        SeederConfig, SeederManager,
    };

    async fn migrated_pool() -> Arc<dyn DatabasePool> {
        let pool = SqliteBackend::new()
            .create_pool("sqlite::memory:", DatabasePoolConfig::single_connection())
            .await
            .unwrap();
        let migrations = crate::database::migrations::registry().unwrap();
        Migrator::new(pool.clone(), &migrations, MigrationConfig::default())
            .migrate()
            .await
            .unwrap();
        pool
    }

    async fn count(pool: &Arc<dyn DatabasePool>, table: &str) -> i64 {
        let row = pool
            .fetch_optional(&format!("SELECT COUNT(*) AS total FROM {}", table), &[])
            .await
            .unwrap()
            .unwrap();
        row.get_i64("total").unwrap()
    }

    #[tokio::test]
    async fn test_posts_seeder_pulls_in_dependencies() {
        let pool = migrated_pool().await;
        let seeders = registry();
        let manager = SeederManager::new(pool.clone(), &seeders, SeederConfig::default());

        let result = manager.run_seeder("posts_seeder").await.unwrap();
        assert_eq!(
            result.executed,
            vec!["roles_permissions_seeder", "users_seeder", "categories_seeder", "posts_seeder"]
        );
        assert_eq!(count(&pool, "posts").await, 3);
        assert_eq!(count(&pool, "user_roles").await, 3);
        assert_eq!(count(&pool, "role_permissions").await, 8);
    }

    #[tokio::test]
    async fn test_full_reseed_keeps_row_counts() {
        let pool = migrated_pool().await;
        let seeders = registry();
        let manager = SeederManager::new(pool.clone(), &seeders, SeederConfig::default());

        manager.run_all_seeders().await.unwrap();
        manager.run_all_seeders().await.unwrap();

        assert_eq!(count(&pool, "roles").await, 3);
        assert_eq!(count(&pool, "users").await, 3);
        assert_eq!(count(&pool, "categories").await, 3);
        assert_eq!(count(&pool, "posts").await, 3);
    }

    #[tokio::test]
    async fn test_clean_removes_seeded_rows() {
        let pool = migrated_pool().await;
        let seeders = registry();
        let manager = SeederManager::new(pool.clone(), &seeders, SeederConfig::default());

        manager.run_all_seeders().await.unwrap();
        let cleaned = manager.clean_all_seeder_data().await.unwrap();

        assert!(cleaned.failed.is_empty());
        assert_eq!(cleaned.cleaned.len(), 4);
        for table in ["posts", "users", "roles", "permissions", "categories"] {
            assert_eq!(count(&pool, table).await, 0, "{} not empty", table);
        }
    }
}
