// JobRadar - lib.rs
//
// Library entry point, exposing all modules for integration testing and for
// the command-line front end in `main.rs`.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;
