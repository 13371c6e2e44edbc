//! MySQL catalog queries

use strata_orm::{DatabasePool, DatabaseRowExt, DatabaseValue, SqlDialect};
use tracing::warn;

use crate::ddl::parse_create_table;
use crate::error::IntrospectResult;
use crate::model::{ColumnInfo, ColumnKey, ForeignKeyInfo, IndexInfo, ReferentialAction};

const FOREIGN_KEYS_SQL: &str = "SELECT kcu.CONSTRAINT_NAME AS constraint_name, \
        kcu.COLUMN_NAME AS column_name, \
        kcu.REFERENCED_TABLE_NAME AS referenced_table, \
        kcu.REFERENCED_COLUMN_NAME AS referenced_column, \
        rc.DELETE_RULE AS delete_rule, \
        rc.UPDATE_RULE AS update_rule \
    FROM information_schema.KEY_COLUMN_USAGE kcu \
    JOIN information_schema.REFERENTIAL_CONSTRAINTS rc \
        ON rc.CONSTRAINT_SCHEMA = kcu.CONSTRAINT_SCHEMA \
        AND rc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME \
    WHERE kcu.TABLE_SCHEMA = DATABASE() \
        AND kcu.TABLE_NAME = ? \
        AND kcu.REFERENCED_TABLE_NAME IS NOT NULL \
        AND kcu.ORDINAL_POSITION = 1 \
    ORDER BY kcu.CONSTRAINT_NAME";

fn quote(name: &str) -> String {
    SqlDialect::MySQL.quote_identifier(name)
}

pub(crate) async fn list_tables(pool: &dyn DatabasePool) -> IntrospectResult<Vec<String>> {
    let rows = pool.fetch_all(SqlDialect::MySQL.list_tables_sql(), &[]).await?;
    let tables = rows.iter().map(|row| row.first_string()).collect::<Result<Vec<_>, _>>()?;
    Ok(tables)
}

pub(crate) async fn table_exists(pool: &dyn DatabasePool, table: &str) -> IntrospectResult<bool> {
    let row = pool
        .fetch_optional(
            "SELECT TABLE_NAME FROM information_schema.TABLES WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?",
            &[DatabaseValue::from(table)],
        )
        .await?;
    Ok(row.is_some())
}

pub(crate) async fn columns(pool: &dyn DatabasePool, table: &str) -> IntrospectResult<Vec<ColumnInfo>> {
    let rows = pool
        .fetch_all(&format!("SHOW COLUMNS FROM {}", quote(table)), &[])
        .await?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in rows {
        columns.push(ColumnInfo {
            name: row.get_string("Field")?,
            column_type: row.get_string("Type")?,
            nullable: row.get_string("Null")?.eq_ignore_ascii_case("YES"),
            key: ColumnKey::parse(&row.get_optional_string("Key")?.unwrap_or_default()),
            default: row.get_optional_string("Default")?,
            extra: row.get_optional_string("Extra")?.unwrap_or_default(),
        });
    }

    Ok(columns)
}

/// Secondary indexes; `PRIMARY` is skipped
pub(crate) async fn indexes(pool: &dyn DatabasePool, table: &str) -> IntrospectResult<Vec<IndexInfo>> {
    let rows = pool
        .fetch_all(&format!("SHOW INDEX FROM {}", quote(table)), &[])
        .await?;

    let mut indexes: Vec<(IndexInfo, Vec<(i64, String)>)> = Vec::new();
    for row in rows {
        let name = row.get_string("Key_name")?;
        if name == "PRIMARY" {
            continue;
        }

        let column = (row.get_i64("Seq_in_index")?, row.get_string("Column_name")?);
        match indexes.iter_mut().find(|(index, _)| index.name == name) {
            Some((_, columns)) => columns.push(column),
            None => {
                let unique = row.get_i64("Non_unique")? == 0;
                indexes.push((
                    IndexInfo {
                        name,
                        unique,
                        columns: Vec::new(),
                    },
                    vec![column],
                ));
            }
        }
    }

    Ok(indexes
        .into_iter()
        .map(|(mut index, mut columns)| {
            columns.sort_by_key(|(seq, _)| *seq);
            index.columns = columns.into_iter().map(|(_, name)| name).collect();
            index
        })
        .collect())
}

/// Foreign keys from `information_schema`, falling back to scanning
/// `SHOW CREATE TABLE` when the catalog query fails
pub(crate) async fn foreign_keys(pool: &dyn DatabasePool, table: &str) -> IntrospectResult<Vec<ForeignKeyInfo>> {
    match pool.fetch_all(FOREIGN_KEYS_SQL, &[DatabaseValue::from(table)]).await {
        Ok(rows) => {
            let mut foreign_keys = Vec::with_capacity(rows.len());
            for row in rows {
                foreign_keys.push(ForeignKeyInfo {
                    name: row.get_string("constraint_name")?,
                    column: row.get_string("column_name")?,
                    referenced_table: row.get_string("referenced_table")?,
                    referenced_column: row.get_string("referenced_column")?,
                    on_delete: ReferentialAction::normalize(&row.get_optional_string("delete_rule")?.unwrap_or_default()),
                    on_update: ReferentialAction::normalize(&row.get_optional_string("update_rule")?.unwrap_or_default()),
                });
            }
            Ok(foreign_keys)
        }
        Err(e) => {
            warn!("Foreign key catalog query failed for {}, scanning DDL instead: {}", table, e);
            let row = pool
                .fetch_optional(&format!("SHOW CREATE TABLE {}", quote(table)), &[])
                .await?;
            match row {
                Some(row) => Ok(parse_create_table(&row.get_string("Create Table")?)),
                None => Ok(Vec::new()),
            }
        }
    }
}
