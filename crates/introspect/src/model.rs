//! Read-only snapshot of a table's shape

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    /// Secondary indexes; the primary key is carried on its column
    pub indexes: Vec<IndexInfo>,
    pub foreign_keys: Vec<ForeignKeyInfo>,
}

impl TableInfo {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Key role of a column, as MySQL reports it in `SHOW COLUMNS`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColumnKey {
    Primary,
    Unique,
    Multiple,
    #[default]
    None,
}

impl ColumnKey {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "PRI" => ColumnKey::Primary,
            "UNI" => ColumnKey::Unique,
            "MUL" => ColumnKey::Multiple,
            _ => ColumnKey::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    /// Declared type, e.g. `varchar(255)`
    pub column_type: String,
    pub nullable: bool,
    pub key: ColumnKey,
    pub default: Option<String>,
    /// Extra flags, e.g. `auto_increment`
    pub extra: String,
}

impl ColumnInfo {
    pub fn is_primary(&self) -> bool {
        self.key == ColumnKey::Primary
    }

    pub fn is_auto_increment(&self) -> bool {
        self.extra.to_lowercase().contains("auto_increment")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub name: String,
    pub unique: bool,
    /// Columns in index order
    pub columns: Vec<String>,
}

/// `ON DELETE` / `ON UPDATE` behaviour. Anything other than `CASCADE` or
/// `SET NULL` is treated as `RESTRICT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReferentialAction {
    #[default]
    Restrict,
    Cascade,
    SetNull,
}

impl ReferentialAction {
    pub fn normalize(raw: &str) -> Self {
        let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
        match normalized.as_str() {
            "CASCADE" => ReferentialAction::Cascade,
            "SET NULL" => ReferentialAction::SetNull,
            _ => ReferentialAction::Restrict,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyInfo {
    pub name: String,
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
    pub on_delete: ReferentialAction,
    pub on_update: ReferentialAction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_normalization() {
        assert_eq!(ReferentialAction::normalize("cascade"), ReferentialAction::Cascade);
        assert_eq!(ReferentialAction::normalize("SET  NULL"), ReferentialAction::SetNull);
        assert_eq!(ReferentialAction::normalize("NO ACTION"), ReferentialAction::Restrict);
        assert_eq!(ReferentialAction::normalize(""), ReferentialAction::Restrict);
    }

    #[test]
    fn test_column_key_parse() {
        assert_eq!(ColumnKey::parse("PRI"), ColumnKey::Primary);
        assert_eq!(ColumnKey::parse("uni"), ColumnKey::Unique);
        assert_eq!(ColumnKey::parse(""), ColumnKey::None);
    }

    #[test]
    fn test_table_info_serializes() {
        let table = TableInfo {
            name: "users".into(),
            columns: vec![ColumnInfo {
                name: "id".into(),
                column_type: "int".into(),
                nullable: false,
                key: ColumnKey::Primary,
                default: None,
                extra: "auto_increment".into(),
            }],
            indexes: vec![],
            foreign_keys: vec![],
        };

        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["columns"][0]["key"], "Primary");
        assert!(table.column("id").unwrap().is_auto_increment());
    }
}
