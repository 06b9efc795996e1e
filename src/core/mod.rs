// JobRadar - core/mod.rs
//
// Core business logic layer.
// Dependencies: standard library plus pure data crates (regex, chrono, serde,
// rust-stemmers, csv for writer-based export).
// Must NOT depend on: platform, app, or any filesystem/network I/O.

pub mod dedupe;
pub mod export;
pub mod lemma;
pub mod matching;
pub mod model;
pub mod sources;
