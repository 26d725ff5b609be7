//! Issuance request validation.
//!
//! Every check happens before any allocation or store mutation: a rejected
//! request leaves zero residue.

use crate::domain::model::CertificateDraft;
use crate::foundation::{CertificateTypeId, IssuanceError, ResidentId};
use chrono::NaiveDate;

/// Raw issuance request as received from the surrounding request layer.
///
/// `issue_date` arrives as text (`YYYY-MM-DD`); identifiers arrive as raw
/// integers where zero means "not provided".
#[derive(Clone, Debug, Default)]
pub struct IssueRequest {
    pub resident_id: u64,
    pub certificate_type_id: u64,
    pub purpose: String,
    pub issue_date: String,
    pub remarks: Option<String>,
}

/// A request that passed validation, with the date parsed.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedIssue {
    pub resident_id: ResidentId,
    pub certificate_type_id: CertificateTypeId,
    pub purpose: String,
    pub issue_date: NaiveDate,
    pub remarks: Option<String>,
}

impl ValidatedIssue {
    pub fn into_draft(self) -> CertificateDraft {
        CertificateDraft {
            resident_id: self.resident_id,
            certificate_type_id: self.certificate_type_id,
            issue_date: self.issue_date,
            purpose: self.purpose,
            remarks: self.remarks,
        }
    }
}

pub fn validate_request(request: &IssueRequest) -> Result<ValidatedIssue, IssuanceError> {
    if request.resident_id == 0 {
        return Err(IssuanceError::validation("resident_id", "required"));
    }
    if request.certificate_type_id == 0 {
        return Err(IssuanceError::validation("certificate_type_id", "required"));
    }

    let purpose = request.purpose.trim();
    if purpose.is_empty() {
        return Err(IssuanceError::validation("purpose", "required"));
    }

    let issue_date = request.issue_date.trim();
    if issue_date.is_empty() {
        return Err(IssuanceError::validation("issue_date", "required"));
    }
    let issue_date = NaiveDate::parse_from_str(issue_date, "%Y-%m-%d")
        .map_err(|err| IssuanceError::validation("issue_date", format!("expected YYYY-MM-DD: {err}")))?;

    // Blank remarks collapse to absent, matching the legacy NULL column.
    let remarks = request.remarks.as_deref().map(str::trim).filter(|r| !r.is_empty()).map(str::to_string);

    Ok(ValidatedIssue {
        resident_id: ResidentId::new(request.resident_id),
        certificate_type_id: CertificateTypeId::new(request.certificate_type_id),
        purpose: purpose.to_string(),
        issue_date,
        remarks,
    })
}
