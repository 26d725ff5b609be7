//! In-memory store for tests and embedded use.
//!
//! A single mutex around the whole state gives every mutating operation the
//! same atomicity the RocksDB engine gets from its write lock + write batch:
//! counter advance, record row, and uniqueness index move together or not at
//! all.

use crate::domain::control_number::{ControlNumber, Prefix};
use crate::domain::model::{CertificateDraft, CertificateType, IssuedCertificate};
use crate::foundation::{now_nanos, CertificateId, CertificateTypeId, IssuanceError};
use crate::infrastructure::storage::CertificateStore;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

struct MemoryInner {
    types: HashMap<CertificateTypeId, CertificateType>,
    certificates: BTreeMap<u64, IssuedCertificate>,
    by_control_number: HashMap<String, CertificateId>,
    counters: HashMap<String, u64>,
    next_certificate_id: u64,
}

impl MemoryInner {
    fn new() -> Self {
        Self {
            types: HashMap::new(),
            certificates: BTreeMap::new(),
            by_control_number: HashMap::new(),
            counters: HashMap::new(),
            next_certificate_id: 1,
        }
    }

    fn commit_record(&mut self, control_number: ControlNumber, draft: CertificateDraft) -> IssuedCertificate {
        let id = CertificateId::new(self.next_certificate_id);
        self.next_certificate_id += 1;
        let record = IssuedCertificate::from_draft(id, control_number, draft, now_nanos());
        self.by_control_number.insert(record.control_number.to_string(), id);
        self.certificates.insert(id.as_u64(), record.clone());
        record
    }
}

pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self { inner: Mutex::new(MemoryInner::new()) }
    }

    fn lock_inner(&self) -> Result<MutexGuard<'_, MemoryInner>, IssuanceError> {
        self.inner.lock().map_err(|_| IssuanceError::StoreUnavailable {
            operation: "memory store lock".to_string(),
            details: "poisoned".to_string(),
        })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CertificateStore for MemoryStore {
    fn upsert_certificate_type(&self, cert_type: CertificateType) -> Result<(), IssuanceError> {
        self.lock_inner()?.types.insert(cert_type.id, cert_type);
        Ok(())
    }

    fn get_certificate_type(&self, id: CertificateTypeId) -> Result<Option<CertificateType>, IssuanceError> {
        Ok(self.lock_inner()?.types.get(&id).cloned())
    }

    fn list_certificate_types(&self) -> Result<Vec<CertificateType>, IssuanceError> {
        let mut types: Vec<CertificateType> = self.lock_inner()?.types.values().cloned().collect();
        types.sort_by_key(|t| t.id);
        Ok(types)
    }

    fn get_certificate(&self, id: CertificateId) -> Result<Option<IssuedCertificate>, IssuanceError> {
        Ok(self.lock_inner()?.certificates.get(&id.as_u64()).cloned())
    }

    fn get_certificate_by_control_number(
        &self,
        control_number: &ControlNumber,
    ) -> Result<Option<IssuedCertificate>, IssuanceError> {
        let inner = self.lock_inner()?;
        Ok(inner
            .by_control_number
            .get(&control_number.to_string())
            .and_then(|id| inner.certificates.get(&id.as_u64()))
            .cloned())
    }

    fn list_certificates_for_prefix(&self, prefix: &Prefix) -> Result<Vec<IssuedCertificate>, IssuanceError> {
        let inner = self.lock_inner()?;
        let mut records: Vec<IssuedCertificate> =
            inner.certificates.values().filter(|c| c.control_number.prefix() == prefix).cloned().collect();
        records.sort_by_key(|c| c.control_number.sequence());
        Ok(records)
    }

    fn insert_with_next_sequence(
        &self,
        prefix: &Prefix,
        draft: CertificateDraft,
    ) -> Result<IssuedCertificate, IssuanceError> {
        let mut inner = self.lock_inner()?;
        let key = prefix.to_string();
        let last = inner.counters.get(&key).copied().unwrap_or(0);
        let next = last + 1;
        let sequence = u32::try_from(next).map_err(|_| IssuanceError::StoreUnavailable {
            operation: "counter advance".to_string(),
            details: format!("sequence overflow for prefix {prefix}"),
        })?;
        let control_number = ControlNumber::new(prefix.clone(), sequence)?;
        if inner.by_control_number.contains_key(&control_number.to_string()) {
            // Counter behind the uniqueness index means the store is corrupt.
            return Err(IssuanceError::StoreUnavailable {
                operation: "counter advance".to_string(),
                details: format!("control number {control_number} exists ahead of counter"),
            });
        }
        inner.counters.insert(key, next);
        Ok(inner.commit_record(control_number, draft))
    }

    fn max_sequence_for_prefix(&self, prefix: &Prefix) -> Result<Option<u32>, IssuanceError> {
        let inner = self.lock_inner()?;
        let prefix_str = prefix.to_string();
        let max = inner
            .by_control_number
            .keys()
            .filter_map(|cn| cn.strip_prefix(prefix_str.as_str()))
            .filter_map(|tail| tail.parse::<u32>().ok())
            .max();
        Ok(max)
    }

    fn insert_if_control_number_free(
        &self,
        control_number: &ControlNumber,
        draft: CertificateDraft,
    ) -> Result<Option<IssuedCertificate>, IssuanceError> {
        let mut inner = self.lock_inner()?;
        if inner.by_control_number.contains_key(&control_number.to_string()) {
            return Ok(None);
        }
        // Keep the counter at least as high as any directly inserted sequence
        // so both allocation strategies can share the store.
        let key = control_number.prefix().to_string();
        let floor = u64::from(control_number.sequence());
        let counter = inner.counters.entry(key).or_insert(0);
        if *counter < floor {
            *counter = floor;
        }
        Ok(Some(inner.commit_record(control_number.clone(), draft)))
    }

    fn last_allocated_sequence(&self, prefix: &Prefix) -> Result<Option<u64>, IssuanceError> {
        Ok(self.lock_inner()?.counters.get(&prefix.to_string()).copied())
    }
}
