//! Migration Registry - Holds the ordered set of known migrations

use std::collections::HashSet;
use std::sync::Arc;

use super::definitions::Migration;
use crate::error::{OrmError, OrmResult};

/// Registered migrations, keyed by `{timestamp}_{name}`
#[derive(Default)]
pub struct MigrationRegistry {
    migrations: Vec<Arc<dyn Migration>>,
    keys: HashSet<String>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a migration. Two migrations sharing a key is a wiring mistake.
    pub fn register<M: Migration + 'static>(&mut self, migration: M) -> OrmResult<()> {
        self.register_arc(Arc::new(migration))
    }

    pub fn register_arc(&mut self, migration: Arc<dyn Migration>) -> OrmResult<()> {
        let key = migration.key();
        if !self.keys.insert(key.clone()) {
            return Err(OrmError::DuplicateMigration { key });
        }
        self.migrations.push(migration);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Look up a migration by ledger key
    pub fn find(&self, key: &str) -> Option<Arc<dyn Migration>> {
        self.migrations.iter().find(|m| m.key() == key).cloned()
    }

    /// Migrations in apply order: ascending timestamp, registration order on ties
    pub fn ordered(&self) -> Vec<Arc<dyn Migration>> {
        let mut ordered = self.migrations.clone();
        ordered.sort_by(|a, b| a.timestamp().cmp(b.timestamp()));
        ordered
    }
}

impl std::fmt::Debug for MigrationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationRegistry")
            .field("migrations", &self.migrations.iter().map(|m| m.key()).collect::<Vec<_>>())
            .finish()
    }
}
