//! Database Seeding
//!
//! Seeders with declared dependencies, run transactionally and tracked in an
//! audit table.

pub mod audit;
pub mod manager;
mod plan;
pub mod registry;
pub mod seeder;

pub use audit::SeederRecord;
pub use manager::SeederManager;
pub use registry::SeederRegistry;
pub use seeder::*;
