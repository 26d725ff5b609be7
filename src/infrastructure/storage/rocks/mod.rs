//! RocksDB-backed store implementation.
//!
//! `RocksStore` is the persistent implementation of `CertificateStore`.
//! See `engine.rs` for lock semantics and `schema.rs` for column families.

pub mod engine;
pub mod schema;

pub use engine::RocksStore;
