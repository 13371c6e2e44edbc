//! Name and timestamp conventions for migration files

use chrono::{DateTime, Utc};
use strata_orm::migrations::TIMESTAMP_FORMAT;

use crate::error::{CodegenError, CodegenResult};

/// `CreateUsersTable`, `create-users table` -> `create_users_table`
pub fn to_snake_case(name: &str) -> String {
    let mut snake = String::with_capacity(name.len() + 4);
    let mut previous: Option<char> = None;

    for c in name.trim().chars() {
        if c.is_ascii_uppercase() {
            if matches!(previous, Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit()) {
                snake.push('_');
            }
            snake.push(c.to_ascii_lowercase());
        } else if c.is_ascii_alphanumeric() {
            snake.push(c);
        } else if !snake.is_empty() && !snake.ends_with('_') {
            snake.push('_');
        }
        previous = Some(c);
    }

    snake.trim_end_matches('_').to_string()
}

/// `create_users_table` -> `CreateUsersTable`
pub fn to_pascal_case(snake: &str) -> String {
    snake
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Snake-cased migration name, rejected when it cannot name a Rust type
pub fn migration_name(raw: &str) -> CodegenResult<String> {
    let snake = to_snake_case(raw);
    match snake.chars().next() {
        Some(first) if first.is_ascii_alphabetic() => Ok(snake),
        _ => Err(CodegenError::InvalidName(raw.to_string())),
    }
}

/// Table a scaffold creates: `create_users_table` -> `users`
pub fn table_name_from_migration(snake: &str) -> String {
    let name = snake.strip_suffix("_table").unwrap_or(snake);
    let name = name.strip_prefix("create_").unwrap_or(name);
    if name.is_empty() {
        snake.to_string()
    } else {
        name.to_string()
    }
}

pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// `{timestamp}_{name}.rs`
pub fn migration_file_name(timestamp: &str, snake: &str) -> String {
    format!("{}_{}.rs", timestamp, snake)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("CreateUsersTable"), "create_users_table");
        assert_eq!(to_snake_case("create users-table"), "create_users_table");
        assert_eq!(to_snake_case("add_status_to_orders"), "add_status_to_orders");
    }

    #[test]
    fn test_pascal_case() {
        assert_eq!(to_pascal_case("create_users_table"), "CreateUsersTable");
        assert_eq!(to_pascal_case("role_permissions"), "RolePermissions");
    }

    #[test]
    fn test_table_name_from_migration() {
        assert_eq!(table_name_from_migration("create_users_table"), "users");
        assert_eq!(table_name_from_migration("create_role_user_table"), "role_user");
        assert_eq!(table_name_from_migration("orders"), "orders");
        assert_eq!(table_name_from_migration("create_table"), "create");
    }

    #[test]
    fn test_invalid_names() {
        assert!(matches!(migration_name("2fa"), Err(CodegenError::InvalidName(_))));
        assert!(matches!(migration_name("  "), Err(CodegenError::InvalidName(_))));
        assert_eq!(migration_name("Create Orders Table").unwrap(), "create_orders_table");
    }

    #[test]
    fn test_timestamp_format() {
        let time = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(format_timestamp(time), "2024_03_09_070501");
        assert_eq!(migration_file_name("2024_03_09_070501", "create_users_table"), "2024_03_09_070501_create_users_table.rs");
    }
}
