//! Application layer: orchestration of domain logic over infrastructure.

pub mod catalog;
pub mod issuance;

pub use catalog::CertificateTypeCatalog;
pub use issuance::{issue_certificate, IssuanceContext};
