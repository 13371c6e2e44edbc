//! Migration System
//!
//! Versioned schema changes tracked in a ledger table and applied in
//! batches. Migrations are registered in code and run through a
//! [`Migrator`].

pub mod definitions;
pub mod fresh;
pub mod registry;
pub mod rollback;
pub mod runner;

pub use definitions::*;
pub use registry::MigrationRegistry;
pub use runner::Migrator;
