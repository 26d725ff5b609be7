//! End-to-end tests: full issuance flow, concurrency, persistence, config.

#[path = "../fixtures/mod.rs"]
pub mod fixtures;

mod concurrent_issuance;
mod config_loading;
