//! Application schema and seed data registered by the binary

pub mod migrations;
pub mod seeders;
