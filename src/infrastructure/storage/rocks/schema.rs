//! Column family names and fixed metadata keys.
//!
//! Keys:
//! - `certificate_type`: type id as big-endian u64 -> bincode `CertificateType`
//! - `certificate`: certificate id as big-endian u64 -> bincode `IssuedCertificate`
//! - `control_number`: control number string bytes -> certificate id as
//!   big-endian u64 (the uniqueness index; also what the optimistic scan
//!   iterates)
//! - `counter`: prefix string bytes (`COR-2024-03-`) -> last sequence as
//!   big-endian u64
//! - `metadata`: fixed keys below

pub const CF_METADATA: &str = "metadata";
pub const CF_CERTIFICATE_TYPE: &str = "certificate_type";
pub const CF_CERTIFICATE: &str = "certificate";
pub const CF_CONTROL_NUMBER: &str = "control_number";
pub const CF_COUNTER: &str = "counter";

pub const ALL_COLUMN_FAMILIES: &[&str] =
    &[CF_METADATA, CF_CERTIFICATE_TYPE, CF_CERTIFICATE, CF_CONTROL_NUMBER, CF_COUNTER];

pub const KEY_SCHEMA_VERSION: &[u8] = b"schema_version";
pub const KEY_NEXT_CERTIFICATE_ID: &[u8] = b"next_certificate_id";

pub const SCHEMA_VERSION: u32 = 1;

/// Directory name of the store inside a data dir.
pub const STORE_DIR_NAME: &str = "issuance";
