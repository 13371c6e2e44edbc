//! SQLite catalog queries

use strata_orm::{DatabasePool, DatabaseRowExt, DatabaseValue, SqlDialect};
use tracing::warn;

use crate::error::IntrospectResult;
use crate::model::{ColumnInfo, ColumnKey, ForeignKeyInfo, IndexInfo, ReferentialAction};

/// Row of `PRAGMA index_list` with its columns resolved
#[derive(Debug, Clone)]
pub(crate) struct SqliteIndex {
    name: String,
    unique: bool,
    /// `c` for CREATE INDEX, `u` for UNIQUE constraints, `pk` for the primary key
    origin: String,
    columns: Vec<String>,
}

fn quote(name: &str) -> String {
    SqlDialect::SQLite.quote_identifier(name)
}

pub(crate) async fn list_tables(pool: &dyn DatabasePool) -> IntrospectResult<Vec<String>> {
    let rows = pool.fetch_all(SqlDialect::SQLite.list_tables_sql(), &[]).await?;
    let tables = rows.iter().map(|row| row.first_string()).collect::<Result<Vec<_>, _>>()?;
    Ok(tables)
}

/// Stored `CREATE TABLE` text, `None` when the table does not exist
pub(crate) async fn table_sql(pool: &dyn DatabasePool, table: &str) -> IntrospectResult<Option<String>> {
    let row = pool
        .fetch_optional(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?",
            &[DatabaseValue::from(table)],
        )
        .await?;

    match row {
        Some(row) => Ok(Some(row.get_optional_string("sql")?.unwrap_or_default())),
        None => Ok(None),
    }
}

pub(crate) async fn index_list(pool: &dyn DatabasePool, table: &str) -> IntrospectResult<Vec<SqliteIndex>> {
    let rows = pool
        .fetch_all(&format!("PRAGMA index_list({})", quote(table)), &[])
        .await?;

    let mut indexes = Vec::with_capacity(rows.len());
    for row in rows {
        let name = row.get_string("name")?;
        let info = pool
            .fetch_all(&format!("PRAGMA index_info({})", quote(&name)), &[])
            .await?;

        // Expression terms such as lower(email) have no column name
        let mut columns = Vec::with_capacity(info.len());
        let mut has_expression = false;
        for column in &info {
            match column.get_optional_string("name")? {
                Some(column_name) => columns.push((column.get_i64("seqno")?, column_name)),
                None => has_expression = true,
            }
        }
        if has_expression {
            warn!("Skipping index {} on {}: expression indexes are not supported", name, table);
            continue;
        }
        columns.sort_by_key(|(seqno, _)| *seqno);

        indexes.push(SqliteIndex {
            name,
            unique: row.get_i64("unique")? != 0,
            origin: row.get_optional_string("origin")?.unwrap_or_else(|| "c".to_string()),
            columns: columns.into_iter().map(|(_, name)| name).collect(),
        });
    }

    // PRAGMA index_list lists the newest index first
    indexes.reverse();
    Ok(indexes)
}

pub(crate) async fn columns(
    pool: &dyn DatabasePool,
    table: &str,
    ddl: &str,
    indexes: &[SqliteIndex],
) -> IntrospectResult<Vec<ColumnInfo>> {
    let rows = pool
        .fetch_all(&format!("PRAGMA table_info({})", quote(table)), &[])
        .await?;

    let autoincrement = ddl.to_uppercase().contains("AUTOINCREMENT");
    let unique_columns: Vec<&str> = indexes
        .iter()
        .filter(|index| index.unique && index.origin == "u" && index.columns.len() == 1)
        .map(|index| index.columns[0].as_str())
        .collect();

    let mut columns = Vec::with_capacity(rows.len());
    for row in rows {
        let name = row.get_string("name")?;
        let primary = row.get_i64("pk")? > 0;

        let key = if primary {
            ColumnKey::Primary
        } else if unique_columns.contains(&name.as_str()) {
            ColumnKey::Unique
        } else {
            ColumnKey::None
        };

        columns.push(ColumnInfo {
            column_type: row.get_optional_string("type")?.unwrap_or_default(),
            nullable: !primary && row.get_i64("notnull")? == 0,
            key,
            default: row.get_optional_string("dflt_value")?.map(|raw| unquote_default(&raw)),
            extra: if primary && autoincrement {
                "auto_increment".to_string()
            } else {
                String::new()
            },
            name,
        });
    }

    Ok(columns)
}

/// Explicitly created indexes only
pub(crate) fn indexes(index_list: &[SqliteIndex]) -> Vec<IndexInfo> {
    index_list
        .iter()
        .filter(|index| index.origin == "c")
        .map(|index| IndexInfo {
            name: index.name.clone(),
            unique: index.unique,
            columns: index.columns.clone(),
        })
        .collect()
}

pub(crate) async fn foreign_keys(pool: &dyn DatabasePool, table: &str) -> IntrospectResult<Vec<ForeignKeyInfo>> {
    let rows = pool
        .fetch_all(&format!("PRAGMA foreign_key_list({})", quote(table)), &[])
        .await?;

    let mut foreign_keys = Vec::new();
    for row in rows {
        // Only the first column of composite keys is represented
        if row.get_i64("seq")? != 0 {
            continue;
        }
        let column = row.get_string("from")?;
        foreign_keys.push(ForeignKeyInfo {
            name: format!("{}_{}_foreign", table, column),
            referenced_table: row.get_string("table")?,
            referenced_column: row.get_optional_string("to")?.unwrap_or_else(|| "id".to_string()),
            on_delete: ReferentialAction::normalize(&row.get_optional_string("on_delete")?.unwrap_or_default()),
            on_update: ReferentialAction::normalize(&row.get_optional_string("on_update")?.unwrap_or_default()),
            column,
        });
    }

    // PRAGMA foreign_key_list numbers constraints from the last declared one
    foreign_keys.reverse();
    Ok(foreign_keys)
}

/// `'active'` -> `active`, `'it''s'` -> `it's`; expressions pass through
fn unquote_default(raw: &str) -> String {
    let trimmed = raw.trim();
    for mark in ['\'', '"'] {
        if trimmed.len() >= 2 && trimmed.starts_with(mark) && trimmed.ends_with(mark) {
            let inner = &trimmed[1..trimmed.len() - 1];
            return inner.replace(&format!("{mark}{mark}"), &mark.to_string());
        }
    }
    trimmed.to_string()
}
