// JobRadar - platform/mod.rs
//
// Platform abstraction layer.
// Dependencies: standard library, directories, toml; core data types for the
// validated configuration.
// Must NOT depend on: app.

pub mod config;
pub mod fs;
