use crate::domain::control_number::ControlNumber;
use crate::foundation::{CertificateId, CertificateTypeId, ResidentId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A row in the certificate type catalog.
///
/// Owned by configuration data; read-only to the issuance core apart from
/// seeding.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct CertificateType {
    pub id: CertificateTypeId,
    pub name: String,
    pub default_purpose: String,
    pub is_active: bool,
}

/// The validated, not-yet-persisted portion of an issuance.
///
/// The store fills in `id`, `control_number`, and `issued_at_nanos` at commit
/// time.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct CertificateDraft {
    pub resident_id: ResidentId,
    pub certificate_type_id: CertificateTypeId,
    pub issue_date: NaiveDate,
    pub purpose: String,
    pub remarks: Option<String>,
}

/// An issued certificate record. Immutable after creation; never deleted by
/// this core (the record is a legal/audit artifact).
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct IssuedCertificate {
    pub id: CertificateId,
    pub resident_id: ResidentId,
    pub certificate_type_id: CertificateTypeId,
    pub control_number: ControlNumber,
    pub issue_date: NaiveDate,
    pub purpose: String,
    pub remarks: Option<String>,
    pub issued_at_nanos: u64,
}

impl IssuedCertificate {
    pub fn from_draft(
        id: CertificateId,
        control_number: ControlNumber,
        draft: CertificateDraft,
        issued_at_nanos: u64,
    ) -> Self {
        Self {
            id,
            resident_id: draft.resident_id,
            certificate_type_id: draft.certificate_type_id,
            control_number,
            issue_date: draft.issue_date,
            purpose: draft.purpose,
            remarks: draft.remarks,
            issued_at_nanos,
        }
    }
}
