//! Certificate issuance pipeline.
//!
//! `issue_certificate` is the single entry point for the surrounding request
//! layer. It validates, resolves the type code, allocates a control number
//! atomically with persistence, then best-effort notifies the activity feed.

use crate::application::catalog::CertificateTypeCatalog;
use crate::domain::control_number::Prefix;
use crate::domain::model::IssuedCertificate;
use crate::domain::validation::{validate_request, IssueRequest};
use crate::foundation::{IssuanceError, ACTIVITY_PURPOSE_SNIPPET_LEN};
use crate::infrastructure::activity::{ActivityCategory, ActivityRecorder};
use crate::infrastructure::residents::{display_name_or_id, ResidentDirectory};
use crate::infrastructure::storage::{CertificateStore, SequenceAllocator};
use log::{debug, info, warn};
use std::sync::Arc;

#[derive(Clone)]
pub struct IssuanceContext {
    pub store: Arc<dyn CertificateStore>,
    pub residents: Arc<dyn ResidentDirectory>,
    pub activity: Arc<dyn ActivityRecorder>,
    pub allocator: SequenceAllocator,
}

impl IssuanceContext {
    pub fn issue(&self, request: IssueRequest) -> Result<IssuedCertificate, IssuanceError> {
        issue_certificate(self, request)
    }
}

pub fn issue_certificate(ctx: &IssuanceContext, request: IssueRequest) -> Result<IssuedCertificate, IssuanceError> {
    // Validation happens before any allocation work; a rejected request
    // leaves zero residue.
    let validated = validate_request(&request)?;
    debug!(
        "issuance request validated resident_id={} certificate_type_id={} issue_date={}",
        validated.resident_id, validated.certificate_type_id, validated.issue_date
    );

    // Everything past validation is a system fault from the caller's side,
    // so store failures surface wrapped from here on.
    let catalog = CertificateTypeCatalog::new(ctx.store.clone());
    let code = catalog
        .resolve_code(validated.certificate_type_id)
        .map_err(IssuanceError::into_issuance_failure)?;
    let prefix = Prefix::for_issue_date(code, validated.issue_date);
    debug!("control number prefix resolved prefix={prefix}");

    let record = ctx
        .allocator
        .issue(ctx.store.as_ref(), &prefix, validated.into_draft())
        .map_err(IssuanceError::into_issuance_failure)?;
    info!(
        "certificate issued id={} control_number={} resident_id={}",
        record.id, record.control_number, record.resident_id
    );

    // The record is committed; activity logging is strictly best-effort from
    // here on.
    record_issuance_activity(ctx, &record);

    Ok(record)
}

fn record_issuance_activity(ctx: &IssuanceContext, record: &IssuedCertificate) {
    let resident_name = display_name_or_id(ctx.residents.as_ref(), record.resident_id);
    let description = format!(
        "Issued certificate ({}) to {}. Purpose: {}",
        record.control_number,
        resident_name,
        purpose_snippet(&record.purpose),
    );
    ctx.activity.record(&description, ActivityCategory::CertificateIssued);
    debug!("activity recorded control_number={}", record.control_number);
}

/// First 50 characters of the purpose, with an ellipsis when truncated.
fn purpose_snippet(purpose: &str) -> String {
    if purpose.chars().count() <= ACTIVITY_PURPOSE_SNIPPET_LEN {
        purpose.to_string()
    } else {
        let snippet: String = purpose.chars().take(ACTIVITY_PURPOSE_SNIPPET_LEN).collect();
        format!("{snippet}...")
    }
}

/// Assemble a context from opened collaborators. Convenience for embedders;
/// tests wire the struct directly.
pub fn issuance_context(
    store: Arc<dyn CertificateStore>,
    residents: Arc<dyn ResidentDirectory>,
    activity: Arc<dyn ActivityRecorder>,
    allocator: SequenceAllocator,
) -> IssuanceContext {
    if let Err(err) = store.health_check() {
        warn!("store health check failed at context construction: {err}");
    }
    IssuanceContext { store, residents, activity, allocator }
}
