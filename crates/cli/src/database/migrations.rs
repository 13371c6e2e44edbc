use strata_orm::{
    async_trait, DatabaseConnection, Migration, MigrationRegistry, OrmResult, SqlDialect,
};

/// `CREATE TABLE` with dialect-specific id and timestamp columns, plus
/// separate index statements
struct CreateTable {
    timestamp: &'static str,
    name: &'static str,
    table: &'static str,
    columns: fn(SqlDialect) -> Vec<String>,
    indexes: &'static [&'static str],
}

#[async_trait]
impl Migration for CreateTable {
    fn name(&self) -> &str {
        self.name
    }

    fn timestamp(&self) -> &str {
        self.timestamp
    }

    async fn up(&self, conn: &mut dyn DatabaseConnection) -> OrmResult<()> {
        let columns = (self.columns)(conn.dialect());
        let sql = format!("CREATE TABLE {} (\n    {}\n)", self.table, columns.join(",\n    "));
        conn.execute(&sql, &[]).await?;

        for index in self.indexes {
            conn.execute(index, &[]).await?;
        }
        Ok(())
    }

    async fn down(&self, conn: &mut dyn DatabaseConnection) -> OrmResult<()> {
        conn.execute(&format!("DROP TABLE IF EXISTS {}", self.table), &[]).await?;
        Ok(())
    }
}

/// Table constraints go after every column
fn with_id_and_timestamps(dialect: SqlDialect, columns: &[&str], constraints: &[&str]) -> Vec<String> {
    let mut all = vec![dialect.id_column().to_string()];
    all.extend(columns.iter().map(|c| c.to_string()));
    all.push(dialect.timestamp_columns().to_string());
    all.extend(constraints.iter().map(|c| c.to_string()));
    all
}

fn users(dialect: SqlDialect) -> Vec<String> {
    with_id_and_timestamps(
        dialect,
        &[
            "name VARCHAR(255) NOT NULL",
            "email VARCHAR(255) NOT NULL UNIQUE",
            "password VARCHAR(255) NOT NULL",
        ],
        &[],
    )
}

fn roles(dialect: SqlDialect) -> Vec<String> {
    with_id_and_timestamps(
        dialect,
        &["name VARCHAR(100) NOT NULL UNIQUE", "description VARCHAR(255) NULL"],
        &[],
    )
}

fn permissions(dialect: SqlDialect) -> Vec<String> {
    with_id_and_timestamps(
        dialect,
        &["name VARCHAR(100) NOT NULL UNIQUE", "description VARCHAR(255) NULL"],
        &[],
    )
}

fn role_permissions(_dialect: SqlDialect) -> Vec<String> {
    [
        "role_id INTEGER NOT NULL",
        "permission_id INTEGER NOT NULL",
        "PRIMARY KEY (role_id, permission_id)",
        "CONSTRAINT role_permissions_role_id_foreign FOREIGN KEY (role_id) REFERENCES roles(id) ON DELETE CASCADE",
        "CONSTRAINT role_permissions_permission_id_foreign FOREIGN KEY (permission_id) REFERENCES permissions(id) ON DELETE CASCADE",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}

fn user_roles(_dialect: SqlDialect) -> Vec<String> {
    [
        "user_id INTEGER NOT NULL",
        "role_id INTEGER NOT NULL",
        "PRIMARY KEY (user_id, role_id)",
        "CONSTRAINT user_roles_user_id_foreign FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE",
        "CONSTRAINT user_roles_role_id_foreign FOREIGN KEY (role_id) REFERENCES roles(id) ON DELETE CASCADE",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}

fn categories(dialect: SqlDialect) -> Vec<String> {
    with_id_and_timestamps(
        dialect,
        &["name VARCHAR(100) NOT NULL", "slug VARCHAR(100) NOT NULL UNIQUE"],
        &[],
    )
}

fn posts(dialect: SqlDialect) -> Vec<String> {
    with_id_and_timestamps(
        dialect,
        &[
            "user_id INTEGER NOT NULL",
            "category_id INTEGER NULL",
            "title VARCHAR(255) NOT NULL",
            "slug VARCHAR(255) NOT NULL UNIQUE",
            "body TEXT NULL",
        ],
        &[
            "CONSTRAINT posts_user_id_foreign FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE",
            "CONSTRAINT posts_category_id_foreign FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE SET NULL",
        ],
    )
}

/// Every application migration, in no particular order
pub fn registry() -> OrmResult<MigrationRegistry> {
    let mut registry = MigrationRegistry::new();

    let migrations = [
        CreateTable {
            timestamp: "2024_01_01_000001",
            name: "create_users_table",
            table: "users",
            columns: users,
            indexes: &[],
        },
        CreateTable {
            timestamp: "2024_01_01_000002",
            name: "create_roles_table",
            table: "roles",
            columns: roles,
            indexes: &[],
        },
        CreateTable {
            timestamp: "2024_01_01_000003",
            name: "create_permissions_table",
            table: "permissions",
            columns: permissions,
            indexes: &[],
        },
        CreateTable {
            timestamp: "2024_01_01_000004",
            name: "create_role_permissions_table",
            table: "role_permissions",
            columns: role_permissions,
            indexes: &[],
        },
        CreateTable {
            timestamp: "2024_01_01_000005",
            name: "create_user_roles_table",
            table: "user_roles",
            columns: user_roles,
            indexes: &[],
        },
        CreateTable {
            timestamp: "2024_01_02_000001",
            name: "create_categories_table",
            table: "categories",
            columns: categories,
            indexes: &[],
        },
        CreateTable {
            timestamp: "2024_01_02_000002",
            name: "create_posts_table",
            table: "posts",
            columns: posts,
            indexes: &["CREATE INDEX posts_user_id_index ON posts (user_id)"],
        },
    ];

    for migration in migrations {
        registry.register(migration)?;
    }
    Ok(registry)
}
