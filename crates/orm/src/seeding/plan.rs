//! Dependency planning for seeders
//!
//! Both traversals are iterative depth-first walks with an explicit stack.
//! The current path is tracked to report cycles.

use std::collections::HashSet;

use super::registry::SeederRegistry;
use crate::error::{OrmError, OrmResult};

/// How unknown dependency names are treated by [`combined_order`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MissingDependency {
    Fail,
    Skip,
}

struct Frame {
    name: String,
    dependencies: Vec<String>,
    next: usize,
}

impl Frame {
    fn new(registry: &SeederRegistry, name: &str) -> OrmResult<Self> {
        let seeder = registry
            .get(name)
            .ok_or_else(|| OrmError::SeederNotFound(name.to_string()))?;
        Ok(Self {
            name: name.to_string(),
            dependencies: seeder.dependencies(),
            next: 0,
        })
    }

    fn next_dependency(&mut self) -> Option<String> {
        let dependency = self.dependencies.get(self.next).cloned();
        self.next += 1;
        dependency
    }
}

fn cycle(path: &[String], repeated: &str) -> OrmError {
    let start = path.iter().position(|n| n == repeated).unwrap_or(0);
    let mut cycle: Vec<String> = path[start..].to_vec();
    cycle.push(repeated.to_string());
    OrmError::CircularDependency { path: cycle }
}

/// Execution plan of one seeder: every dependency before its dependent,
/// post-order, without deduplication. A dependency reached twice appears
/// twice.
pub(crate) fn expand(registry: &SeederRegistry, root: &str) -> OrmResult<Vec<String>> {
    let mut plan = Vec::new();
    let mut stack = vec![Frame::new(registry, root)?];
    let mut path = vec![root.to_string()];

    loop {
        let next = match stack.last_mut() {
            Some(frame) => frame.next_dependency(),
            None => break,
        };

        match next {
            Some(dependency) => {
                if path.contains(&dependency) {
                    return Err(cycle(&path, &dependency));
                }
                stack.push(Frame::new(registry, &dependency)?);
                path.push(dependency);
            }
            None => {
                if let Some(frame) = stack.pop() {
                    path.pop();
                    plan.push(frame.name);
                }
            }
        }
    }

    Ok(plan)
}

/// One order over every registered seeder, dependencies first, registration
/// order breaking ties. Each name appears once.
pub(crate) fn combined_order(registry: &SeederRegistry, missing: MissingDependency) -> OrmResult<Vec<String>> {
    let mut order = Vec::new();
    let mut done: HashSet<String> = HashSet::new();

    for root in registry.names() {
        if done.contains(&root) {
            continue;
        }

        let mut stack = vec![Frame::new(registry, &root)?];
        let mut path = vec![root.clone()];

        loop {
            let next = match stack.last_mut() {
                Some(frame) => frame.next_dependency(),
                None => break,
            };

            match next {
                Some(dependency) => {
                    if done.contains(&dependency) {
                        continue;
                    }
                    if path.contains(&dependency) {
                        return Err(cycle(&path, &dependency));
                    }
                    if !registry.contains(&dependency) {
                        match missing {
                            MissingDependency::Fail => return Err(OrmError::SeederNotFound(dependency)),
                            MissingDependency::Skip => continue,
                        }
                    }
                    stack.push(Frame::new(registry, &dependency)?);
                    path.push(dependency);
                }
                None => {
                    if let Some(frame) = stack.pop() {
                        path.pop();
                        done.insert(frame.name.clone());
                        order.push(frame.name);
                    }
                }
            }
        }
    }

    Ok(order)
}
