//! Domain layer: pure data and pure logic, no I/O.

pub mod control_number;
pub mod model;
pub mod validation;

pub use control_number::{ControlNumber, Prefix, TypeCode};
pub use model::{CertificateDraft, CertificateType, IssuedCertificate};
pub use validation::{validate_request, IssueRequest, ValidatedIssue};
