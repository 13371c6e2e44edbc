//! Seeder Registry - name-keyed set of seeders

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::seeder::Seeder;

/// Registered seeders in registration order.
///
/// Registering a name twice replaces the earlier seeder in its original
/// position.
#[derive(Default)]
pub struct SeederRegistry {
    seeders: Vec<Arc<dyn Seeder>>,
    index: HashMap<String, usize>,
}

impl SeederRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<S: Seeder + 'static>(&mut self, seeder: S) {
        self.register_arc(Arc::new(seeder));
    }

    pub fn register_arc(&mut self, seeder: Arc<dyn Seeder>) {
        let name = seeder.name().to_string();
        match self.index.get(&name) {
            Some(&position) => {
                debug!("Replacing seeder: {}", name);
                self.seeders[position] = seeder;
            }
            None => {
                debug!("Registered seeder: {}", name);
                self.index.insert(name, self.seeders.len());
                self.seeders.push(seeder);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Seeder>> {
        self.index.get(name).map(|&position| self.seeders[position].clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Seeder names in registration order
    pub fn names(&self) -> Vec<String> {
        self.seeders.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Seeder>> {
        self.seeders.iter()
    }

    pub fn len(&self) -> usize {
        self.seeders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeders.is_empty()
    }
}

impl std::fmt::Debug for SeederRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeederRegistry").field("seeders", &self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::DatabaseConnection;
    use crate::error::OrmResult;
    use async_trait::async_trait;

    struct Named(&'static str, Vec<&'static str>);

    #[async_trait]
    impl Seeder for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn dependencies(&self) -> Vec<String> {
            self.1.iter().map(|d| d.to_string()).collect()
        }

        async fn seed(&self, _conn: &mut dyn DatabaseConnection) -> OrmResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_last_registration_wins_in_place() {
        let mut registry = SeederRegistry::new();
        registry.register(Named("roles", vec![]));
        registry.register(Named("users", vec![]));
        registry.register(Named("roles", vec!["users"]));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["roles", "users"]);
        assert_eq!(registry.get("roles").unwrap().dependencies(), vec!["users"]);
    }

    #[test]
    fn test_unknown_name() {
        let registry = SeederRegistry::new();
        assert!(registry.get("users").is_none());
        assert!(!registry.contains("users"));
    }
}
