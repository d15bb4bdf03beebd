// ABOUTME: Library root for caravel - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod backend;
pub mod bucket;
pub mod commands;
pub mod deploy;
pub mod error;
pub mod manifest;
pub mod secrets;
pub mod store;
pub mod term;
pub mod workspace;
