use std::collections::HashMap;

use crate::error::{CodegenError, CodegenResult};

/// Replace every `{{key}}` placeholder in one pass over the template.
/// Substituted values are never rescanned. A placeholder left without a
/// value is an error.
pub fn render_template(template: &str, context: &HashMap<&str, String>) -> CodegenResult<String> {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            return Err(CodegenError::Template {
                message: format!("unterminated placeholder {}", &rest[start..]),
            });
        };

        let key = &after[..end];
        match context.get(key) {
            Some(value) => result.push_str(value),
            None => {
                return Err(CodegenError::Template {
                    message: format!("unresolved placeholder {{{{{}}}}}", key),
                })
            }
        }
        rest = &after[end + 2..];
    }
    result.push_str(rest);

    Ok(result)
}

/// Raw string literal holding `text`, with enough `#` to never close early
pub fn raw_string_literal(text: &str) -> String {
    let mut hashes = 1;
    while text.contains(&format!("\"{}", "#".repeat(hashes))) {
        hashes += 1;
    }
    let fence = "#".repeat(hashes);
    format!("r{fence}\"{text}\"{fence}")
}

pub static MIGRATION_TEMPLATE: &str = r#"use strata_orm::{async_trait, DatabaseConnection, Migration, OrmResult};

pub struct {{struct_name}};

#[async_trait]
impl Migration for {{struct_name}} {
    fn name(&self) -> &str {
        "{{name}}"
    }

    fn timestamp(&self) -> &str {
        "{{timestamp}}"
    }

    async fn up(&self, conn: &mut dyn DatabaseConnection) -> OrmResult<()> {
{{up}}
        Ok(())
    }

    async fn down(&self, conn: &mut dyn DatabaseConnection) -> OrmResult<()> {
        conn.execute("DROP TABLE IF EXISTS {{table}}", &[]).await?;
        Ok(())
    }
}
"#;

pub static SCAFFOLD_UP: &str = r#"        let dialect = conn.dialect();
        let sql = format!(
            "CREATE TABLE {{table}} ({}, {})",
            dialect.id_column(),
            dialect.timestamp_columns()
        );
        conn.execute(&sql, &[]).await?;"#;

pub static EXECUTE_STATEMENT: &str = r#"        conn.execute({{sql}}, &[]).await?;"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fills_placeholders() {
        let mut context = HashMap::new();
        context.insert("table", "users".to_string());
        let rendered = render_template("DROP TABLE {{table}}", &context).unwrap();
        assert_eq!(rendered, "DROP TABLE users");
    }

    #[test]
    fn test_render_rejects_missing_value() {
        let context = HashMap::new();
        let err = render_template("DROP TABLE {{table}}", &context).unwrap_err();
        assert!(err.to_string().contains("{{table}}"));
    }

    #[test]
    fn test_render_leaves_braces_in_values() {
        let mut context = HashMap::new();
        context.insert("sql", "DEFAULT '{{name}}'".to_string());
        context.insert("name", "settings".to_string());
        let rendered = render_template("{{name}}: {{sql}}", &context).unwrap();
        assert_eq!(rendered, "settings: DEFAULT '{{name}}'");
    }

    #[test]
    fn test_raw_string_literal_fences() {
        assert_eq!(raw_string_literal("SELECT 1"), "r#\"SELECT 1\"#");
        assert_eq!(raw_string_literal("DEFAULT '\"#'"), "r##\"DEFAULT '\"#'\"##");
    }
}
