//! Creation order of tables from their foreign keys

use std::collections::HashMap;

use crate::error::{IntrospectError, IntrospectResult};
use crate::model::ForeignKeyInfo;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    InProgress,
    Done,
}

/// Order `tables` so every referenced table precedes the tables that
/// reference it.
///
/// Self-references and references to tables outside `tables` are ignored.
/// Ties keep input order. A reference cycle is an error.
pub fn order_by_dependency(
    tables: &[String],
    foreign_keys: &HashMap<String, Vec<ForeignKeyInfo>>,
) -> IntrospectResult<Vec<String>> {
    let position: HashMap<&str, usize> = tables.iter().enumerate().map(|(i, t)| (t.as_str(), i)).collect();

    let adjacency: Vec<Vec<usize>> = tables
        .iter()
        .enumerate()
        .map(|(i, table)| {
            let mut targets: Vec<usize> = Vec::new();
            for fk in foreign_keys.get(table).into_iter().flatten() {
                if let Some(&target) = position.get(fk.referenced_table.as_str()) {
                    if target != i && !targets.contains(&target) {
                        targets.push(target);
                    }
                }
            }
            targets
        })
        .collect();

    let mut state = vec![Visit::Unvisited; tables.len()];
    let mut order = Vec::with_capacity(tables.len());

    for root in 0..tables.len() {
        if state[root] != Visit::Unvisited {
            continue;
        }

        // (table, next neighbour to look at)
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
        state[root] = Visit::InProgress;

        while let Some(frame) = stack.last_mut() {
            let (node, next) = *frame;
            frame.1 += 1;

            if let Some(&target) = adjacency[node].get(next) {
                match state[target] {
                    Visit::Unvisited => {
                        state[target] = Visit::InProgress;
                        stack.push((target, 0));
                    }
                    Visit::InProgress => {
                        let start = stack.iter().position(|&(n, _)| n == target).unwrap_or(0);
                        let mut cycle: Vec<String> = stack[start..].iter().map(|&(n, _)| tables[n].clone()).collect();
                        cycle.push(tables[target].clone());
                        return Err(IntrospectError::CircularDependency { tables: cycle });
                    }
                    Visit::Done => {}
                }
            } else {
                state[node] = Visit::Done;
                order.push(tables[node].clone());
                stack.pop();
            }
        }
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReferentialAction;

    fn fk(table: &str, column: &str, referenced: &str) -> ForeignKeyInfo {
        ForeignKeyInfo {
            name: format!("{}_{}_foreign", table, column),
            column: column.to_string(),
            referenced_table: referenced.to_string(),
            referenced_column: "id".to_string(),
            on_delete: ReferentialAction::Restrict,
            on_update: ReferentialAction::Restrict,
        }
    }

    fn blog_graph() -> HashMap<String, Vec<ForeignKeyInfo>> {
        let mut graph = HashMap::new();
        graph.insert(
            "posts".to_string(),
            vec![fk("posts", "user_id", "users"), fk("posts", "category_id", "categories")],
        );
        graph.insert(
            "role_user".to_string(),
            vec![fk("role_user", "user_id", "users"), fk("role_user", "role_id", "roles")],
        );
        graph.insert("categories".to_string(), vec![fk("categories", "parent_id", "categories")]);
        graph.insert("comments".to_string(), vec![fk("comments", "post_id", "posts")]);
        graph
    }

    fn assert_dependencies_first(order: &[String], graph: &HashMap<String, Vec<ForeignKeyInfo>>) {
        let index = |name: &str| order.iter().position(|t| t == name);
        for (table, fks) in graph {
            for fk in fks {
                if fk.referenced_table == *table {
                    continue;
                }
                if let (Some(referrer), Some(referenced)) = (index(table), index(&fk.referenced_table)) {
                    assert!(referenced < referrer, "{} must precede {} in {:?}", fk.referenced_table, table, order);
                }
            }
        }
    }

    fn permutations(items: &[String]) -> Vec<Vec<String>> {
        if items.len() <= 1 {
            return vec![items.to_vec()];
        }
        let mut result = Vec::new();
        for i in 0..items.len() {
            let mut rest = items.to_vec();
            let head = rest.remove(i);
            for mut tail in permutations(&rest) {
                tail.insert(0, head.clone());
                result.push(tail);
            }
        }
        result
    }

    #[test]
    fn test_referenced_tables_come_first() {
        let tables: Vec<String> = ["comments", "posts", "users", "categories"].iter().map(|s| s.to_string()).collect();
        let order = order_by_dependency(&tables, &blog_graph()).unwrap();

        assert_eq!(order, vec!["users", "categories", "posts", "comments"]);
    }

    #[test]
    fn test_order_holds_for_every_permutation() {
        let graph = blog_graph();
        let tables: Vec<String> = ["comments", "posts", "users", "categories", "roles", "role_user"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        for permutation in permutations(&tables) {
            let order = order_by_dependency(&permutation, &graph).unwrap();
            assert_eq!(order.len(), tables.len());
            assert_dependencies_first(&order, &graph);
        }
    }

    #[test]
    fn test_independent_tables_keep_input_order() {
        let tables: Vec<String> = ["zeta", "alpha", "mid"].iter().map(|s| s.to_string()).collect();
        let order = order_by_dependency(&tables, &HashMap::new()).unwrap();
        assert_eq!(order, tables);
    }

    #[test]
    fn test_out_of_scope_reference_ignored() {
        let tables = vec!["posts".to_string()];
        let order = order_by_dependency(&tables, &blog_graph()).unwrap();
        assert_eq!(order, vec!["posts"]);
    }

    #[test]
    fn test_cycle_is_reported() {
        let mut graph = HashMap::new();
        graph.insert("a".to_string(), vec![fk("a", "b_id", "b")]);
        graph.insert("b".to_string(), vec![fk("b", "a_id", "a")]);
        let tables = vec!["a".to_string(), "b".to_string()];

        match order_by_dependency(&tables, &graph).unwrap_err() {
            IntrospectError::CircularDependency { tables } => assert_eq!(tables, vec!["a", "b", "a"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
