// JobRadar - app/mod.rs
//
// Application layer: scan orchestration, message-source collaborators,
// report persistence.
// Dependencies: core layer, platform::fs for atomic writes.

pub mod demo;
pub mod report_store;
pub mod scan;
pub mod source;
