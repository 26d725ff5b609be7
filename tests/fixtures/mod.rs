//! Shared test fixtures.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use tala_core::domain::control_number::{ControlNumber, Prefix};
use tala_core::domain::model::{CertificateDraft, CertificateType, IssuedCertificate};
use tala_core::domain::validation::IssueRequest;
use tala_core::foundation::{CertificateId, CertificateTypeId, IssuanceError, ResidentId};
use tala_core::infrastructure::activity::{ActivityCategory, ActivityRecorder};
use tala_core::infrastructure::residents::StaticResidentDirectory;
use tala_core::infrastructure::storage::CertificateStore;

/// Catalog rows mirroring the seed data of the surrounding application.
pub fn seed_certificate_types(store: &dyn CertificateStore) {
    let types = [
        (1, "Certificate of Residency", "Proof of residency"),
        (2, "Barangay Clearance", "General clearance"),
        (3, "Certificate of Indigency", "Financial assistance"),
    ];
    for (id, name, purpose) in types {
        store
            .upsert_certificate_type(CertificateType {
                id: CertificateTypeId::new(id),
                name: name.to_string(),
                default_purpose: purpose.to_string(),
                is_active: true,
            })
            .expect("seed certificate type");
    }
}

pub fn sample_request(certificate_type_id: u64, issue_date: &str) -> IssueRequest {
    IssueRequest {
        resident_id: 42,
        certificate_type_id,
        purpose: "Scholarship application".to_string(),
        issue_date: issue_date.to_string(),
        remarks: None,
    }
}

pub fn sample_draft(issue_date: chrono::NaiveDate) -> CertificateDraft {
    CertificateDraft {
        resident_id: ResidentId::new(42),
        certificate_type_id: CertificateTypeId::new(3),
        issue_date,
        purpose: "Scholarship application".to_string(),
        remarks: None,
    }
}

pub fn residents_directory() -> Arc<StaticResidentDirectory> {
    Arc::new(StaticResidentDirectory::new().with_resident(42, "Juan Dela Cruz"))
}

/// Recorder that keeps entries in memory for assertions.
#[derive(Default)]
pub struct CollectingRecorder {
    entries: Mutex<Vec<(String, ActivityCategory)>>,
}

impl CollectingRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(String, ActivityCategory)> {
        self.entries.lock().expect("recorder lock").clone()
    }
}

impl ActivityRecorder for CollectingRecorder {
    fn record(&self, description: &str, category: ActivityCategory) {
        self.entries.lock().expect("recorder lock").push((description.to_string(), category));
    }
}

/// Store whose certificate type lookups fail, simulating a backend outage
/// hit before any allocation work starts.
pub struct TypeLookupOutageStore;

impl CertificateStore for TypeLookupOutageStore {
    fn upsert_certificate_type(&self, _cert_type: CertificateType) -> Result<(), IssuanceError> {
        Ok(())
    }

    fn get_certificate_type(&self, _id: CertificateTypeId) -> Result<Option<CertificateType>, IssuanceError> {
        Err(IssuanceError::StoreUnavailable {
            operation: "get_certificate_type".to_string(),
            details: "backend offline".to_string(),
        })
    }

    fn list_certificate_types(&self) -> Result<Vec<CertificateType>, IssuanceError> {
        Ok(Vec::new())
    }

    fn get_certificate(&self, _id: CertificateId) -> Result<Option<IssuedCertificate>, IssuanceError> {
        Ok(None)
    }

    fn get_certificate_by_control_number(
        &self,
        _control_number: &ControlNumber,
    ) -> Result<Option<IssuedCertificate>, IssuanceError> {
        Ok(None)
    }

    fn list_certificates_for_prefix(&self, _prefix: &Prefix) -> Result<Vec<IssuedCertificate>, IssuanceError> {
        Ok(Vec::new())
    }

    fn insert_with_next_sequence(
        &self,
        _prefix: &Prefix,
        _draft: CertificateDraft,
    ) -> Result<IssuedCertificate, IssuanceError> {
        Err(IssuanceError::StoreUnavailable { operation: "insert".to_string(), details: "backend offline".to_string() })
    }

    fn max_sequence_for_prefix(&self, _prefix: &Prefix) -> Result<Option<u32>, IssuanceError> {
        Ok(None)
    }

    fn insert_if_control_number_free(
        &self,
        _control_number: &ControlNumber,
        _draft: CertificateDraft,
    ) -> Result<Option<IssuedCertificate>, IssuanceError> {
        Ok(None)
    }

    fn last_allocated_sequence(&self, _prefix: &Prefix) -> Result<Option<u64>, IssuanceError> {
        Ok(None)
    }
}

/// Store whose optimistic insert always reports the control number as taken.
/// Exercises the retry-exhaustion path without real contention.
pub struct AlwaysTakenStore;

impl CertificateStore for AlwaysTakenStore {
    fn upsert_certificate_type(&self, _cert_type: CertificateType) -> Result<(), IssuanceError> {
        Ok(())
    }

    fn get_certificate_type(&self, _id: CertificateTypeId) -> Result<Option<CertificateType>, IssuanceError> {
        Ok(None)
    }

    fn list_certificate_types(&self) -> Result<Vec<CertificateType>, IssuanceError> {
        Ok(Vec::new())
    }

    fn get_certificate(&self, _id: CertificateId) -> Result<Option<IssuedCertificate>, IssuanceError> {
        Ok(None)
    }

    fn get_certificate_by_control_number(
        &self,
        _control_number: &ControlNumber,
    ) -> Result<Option<IssuedCertificate>, IssuanceError> {
        Ok(None)
    }

    fn list_certificates_for_prefix(&self, _prefix: &Prefix) -> Result<Vec<IssuedCertificate>, IssuanceError> {
        Ok(Vec::new())
    }

    fn insert_with_next_sequence(
        &self,
        _prefix: &Prefix,
        _draft: CertificateDraft,
    ) -> Result<IssuedCertificate, IssuanceError> {
        Err(IssuanceError::StoreUnavailable { operation: "insert".to_string(), details: "unsupported".to_string() })
    }

    fn max_sequence_for_prefix(&self, _prefix: &Prefix) -> Result<Option<u32>, IssuanceError> {
        Ok(Some(41))
    }

    fn insert_if_control_number_free(
        &self,
        _control_number: &ControlNumber,
        _draft: CertificateDraft,
    ) -> Result<Option<IssuedCertificate>, IssuanceError> {
        Ok(None)
    }

    fn last_allocated_sequence(&self, _prefix: &Prefix) -> Result<Option<u64>, IssuanceError> {
        Ok(None)
    }
}
