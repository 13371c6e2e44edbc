//! # strata-codegen
//!
//! Writes Rust migration sources, either scaffolds from a name or exact
//! recreations of introspected tables.

pub mod error;
pub mod generator;
pub mod naming;
pub mod sql;
pub mod templates;
pub mod writer;

pub use error::{CodegenError, CodegenResult};
pub use generator::{GenerationReport, MigrationGenerator};
pub use naming::format_timestamp;
pub use writer::{CodeWriter, GenerationOutcome};
