//! Best-effort scan of `CREATE TABLE` text for foreign key constraints.
//!
//! Used when the structured catalog is unavailable. Not a SQL parser: each
//! line is matched on its own.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::{ForeignKeyInfo, ReferentialAction};

const IDENT: &str = r#"[`"\[]?([\w$]+)[`"\]]?"#;

fn constraint_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            let pattern = format!(
                r"(?i)CONSTRAINT\s+{id}\s+FOREIGN\s+KEY\s*\(\s*{id}\s*\)\s*REFERENCES\s+{id}\s*\(\s*{id}\s*\)",
                id = IDENT
            );
            Regex::new(&pattern).ok()
        })
        .as_ref()
}

fn action_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)ON\s+(DELETE|UPDATE)\s+(CASCADE|SET\s+NULL)").ok())
        .as_ref()
}

/// Parse one `CONSTRAINT n FOREIGN KEY (c) REFERENCES t (rc) ...` line.
///
/// Returns `None` unless constraint name, column, referenced table and
/// referenced column were all found. Actions default to `RESTRICT`.
pub fn parse_foreign_key_line(line: &str) -> Option<ForeignKeyInfo> {
    let captures = constraint_pattern()?.captures(line)?;

    let mut foreign_key = ForeignKeyInfo {
        name: captures.get(1)?.as_str().to_string(),
        column: captures.get(2)?.as_str().to_string(),
        referenced_table: captures.get(3)?.as_str().to_string(),
        referenced_column: captures.get(4)?.as_str().to_string(),
        on_delete: ReferentialAction::Restrict,
        on_update: ReferentialAction::Restrict,
    };

    if let Some(actions) = action_pattern() {
        for action in actions.captures_iter(line) {
            let behaviour = ReferentialAction::normalize(&action[2]);
            if action[1].eq_ignore_ascii_case("DELETE") {
                foreign_key.on_delete = behaviour;
            } else {
                foreign_key.on_update = behaviour;
            }
        }
    }

    Some(foreign_key)
}

/// Every foreign key declared in a `CREATE TABLE` statement
pub fn parse_create_table(ddl: &str) -> Vec<ForeignKeyInfo> {
    ddl.lines()
        .filter(|line| {
            let upper = line.to_uppercase();
            upper.contains("CONSTRAINT") && upper.contains("FOREIGN KEY")
        })
        .filter_map(parse_foreign_key_line)
        .collect()
}
