//! DDL rendering of introspected tables

use strata_introspect::{ColumnInfo, ColumnKey, ForeignKeyInfo, IndexInfo, ReferentialAction, TableInfo};
use strata_orm::SqlDialect;

/// `name TYPE [PRIMARY KEY] [AUTO_INCREMENT] [UNIQUE] [NOT NULL] [DEFAULT ...]`
pub fn column_definition(column: &ColumnInfo, dialect: SqlDialect) -> String {
    let mut parts = vec![column.name.clone(), column.column_type.to_uppercase()];

    if column.is_primary() {
        parts.push("PRIMARY KEY".to_string());
    }
    if column.is_auto_increment() {
        parts.push(dialect.auto_increment().to_string());
    }
    if column.key == ColumnKey::Unique {
        parts.push("UNIQUE".to_string());
    }
    if !column.nullable && !column.is_primary() {
        parts.push("NOT NULL".to_string());
    }
    if let Some(default) = &column.default {
        parts.push(default_clause(default));
    }

    parts.retain(|part| !part.is_empty());
    parts.join(" ")
}

fn default_clause(value: &str) -> String {
    if value.eq_ignore_ascii_case("CURRENT_TIMESTAMP") {
        "DEFAULT CURRENT_TIMESTAMP".to_string()
    } else {
        format!("DEFAULT '{}'", value.replace('\'', "''"))
    }
}

/// `[UNIQUE ]INDEX name (a, b)` inside `CREATE TABLE`
pub fn index_definition(index: &IndexInfo) -> String {
    format!(
        "{}INDEX {} ({})",
        if index.unique { "UNIQUE " } else { "" },
        index.name,
        index.columns.join(", ")
    )
}

/// Standalone `CREATE [UNIQUE ]INDEX name ON table (a, b)`
pub fn create_index_statement(table: &str, index: &IndexInfo) -> String {
    format!(
        "CREATE {}INDEX {} ON {} ({})",
        if index.unique { "UNIQUE " } else { "" },
        index.name,
        table,
        index.columns.join(", ")
    )
}

/// `CONSTRAINT n FOREIGN KEY (c) REFERENCES t(rc)`, actions only when not `RESTRICT`
pub fn foreign_key_definition(fk: &ForeignKeyInfo) -> String {
    let mut definition = format!(
        "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({})",
        fk.name, fk.column, fk.referenced_table, fk.referenced_column
    );
    if fk.on_delete != ReferentialAction::Restrict {
        definition.push_str(&format!(" ON DELETE {}", fk.on_delete));
    }
    if fk.on_update != ReferentialAction::Restrict {
        definition.push_str(&format!(" ON UPDATE {}", fk.on_update));
    }
    definition
}

/// Statements recreating `table`: one `CREATE TABLE`, followed by
/// `CREATE INDEX` statements where the dialect has no inline indexes.
pub fn create_table_statements(table: &TableInfo, dialect: SqlDialect) -> Vec<String> {
    let mut definitions: Vec<String> = table
        .columns
        .iter()
        .map(|column| column_definition(column, dialect))
        .collect();

    let inline_indexes = dialect == SqlDialect::MySQL;
    if inline_indexes {
        definitions.extend(table.indexes.iter().map(index_definition));
    }
    definitions.extend(table.foreign_keys.iter().map(foreign_key_definition));

    let mut statements = vec![format!(
        "CREATE TABLE {} (\n    {}\n)",
        table.name,
        definitions.join(",\n    ")
    )];

    if !inline_indexes {
        statements.extend(
            table
                .indexes
                .iter()
                .map(|index| create_index_statement(&table.name, index)),
        );
    }

    statements
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, column_type: &str) -> ColumnInfo {
        ColumnInfo {
            name: name.to_string(),
            column_type: column_type.to_string(),
            nullable: true,
            key: ColumnKey::None,
            default: None,
            extra: String::new(),
        }
    }

    #[test]
    fn test_primary_key_constraints() {
        let id = ColumnInfo {
            key: ColumnKey::Primary,
            extra: "auto_increment".to_string(),
            nullable: false,
            ..column("id", "int")
        };

        assert_eq!(column_definition(&id, SqlDialect::MySQL), "id INT PRIMARY KEY AUTO_INCREMENT");
        assert_eq!(column_definition(&id, SqlDialect::SQLite), "id INT PRIMARY KEY AUTOINCREMENT");
    }

    #[test]
    fn test_defaults() {
        let created_at = ColumnInfo {
            default: Some("CURRENT_TIMESTAMP".to_string()),
            ..column("created_at", "timestamp")
        };
        assert_eq!(
            column_definition(&created_at, SqlDialect::MySQL),
            "created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP"
        );

        let status = ColumnInfo {
            default: Some("active".to_string()),
            nullable: false,
            ..column("status", "varchar(20)")
        };
        assert_eq!(
            column_definition(&status, SqlDialect::MySQL),
            "status VARCHAR(20) NOT NULL DEFAULT 'active'"
        );

        let quoted = ColumnInfo {
            default: Some("it's".to_string()),
            ..column("note", "text")
        };
        assert_eq!(column_definition(&quoted, SqlDialect::MySQL), "note TEXT DEFAULT 'it''s'");
    }

    #[test]
    fn test_unique_column() {
        let email = ColumnInfo {
            key: ColumnKey::Unique,
            nullable: false,
            ..column("email", "varchar(255)")
        };
        assert_eq!(column_definition(&email, SqlDialect::MySQL), "email VARCHAR(255) UNIQUE NOT NULL");
    }

    #[test]
    fn test_index_and_foreign_key() {
        let index = IndexInfo {
            name: "posts_slug_unique".to_string(),
            unique: true,
            columns: vec!["slug".to_string(), "user_id".to_string()],
        };
        assert_eq!(index_definition(&index), "UNIQUE INDEX posts_slug_unique (slug, user_id)");

        let fk = ForeignKeyInfo {
            name: "posts_user_id_foreign".to_string(),
            column: "user_id".to_string(),
            referenced_table: "users".to_string(),
            referenced_column: "id".to_string(),
            on_delete: ReferentialAction::Cascade,
            on_update: ReferentialAction::Restrict,
        };
        assert_eq!(
            foreign_key_definition(&fk),
            "CONSTRAINT posts_user_id_foreign FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE"
        );
    }

    #[test]
    fn test_sqlite_indexes_become_statements() {
        let table = TableInfo {
            name: "posts".to_string(),
            columns: vec![column("title", "varchar(255)")],
            indexes: vec![IndexInfo {
                name: "posts_title_index".to_string(),
                unique: false,
                columns: vec!["title".to_string()],
            }],
            foreign_keys: vec![],
        };

        let mysql = create_table_statements(&table, SqlDialect::MySQL);
        assert_eq!(mysql.len(), 1);
        assert!(mysql[0].contains("INDEX posts_title_index (title)"));

        let sqlite = create_table_statements(&table, SqlDialect::SQLite);
        assert_eq!(sqlite.len(), 2);
        assert_eq!(sqlite[1], "CREATE INDEX posts_title_index ON posts (title)");
    }
}
