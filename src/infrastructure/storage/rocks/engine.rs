//! RocksDB-backed certificate store.
//!
//! # Lock Semantics
//!
//! RocksDB itself is thread-safe, but issuance needs a higher-level invariant:
//! the counter read-increment, the uniqueness check, and the record insert
//! must observe and produce a consistent state. A single `write_lock` guards
//! every mutating operation; it is acquired with a bounded timeout
//! (`STORAGE_LOCK_TIMEOUT_SECS`) and held only for the increment-and-insert
//! critical section. Reads take no lock.
//!
//! # Atomicity
//!
//! Every mutation commits through one `WriteBatch`: counter advance, record
//! row, control-number index, and id-counter bump land together or not at
//! all, so a failed issuance leaves zero residue and sequence gaps can only
//! come from a wholly unwritten batch.

use crate::domain::control_number::{ControlNumber, Prefix};
use crate::domain::model::{CertificateDraft, CertificateType, IssuedCertificate};
use crate::foundation::{now_nanos, CertificateId, CertificateTypeId, IssuanceError, STORAGE_LOCK_TIMEOUT_SECS};
use crate::infrastructure::storage::rocks::schema::*;
use crate::infrastructure::storage::CertificateStore;
use crate::storage_err;
use log::{debug, info, trace};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options as RocksOptions, WriteBatch, DB};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::time::{Duration, Instant};

const WRITE_LOCK_POLL: Duration = Duration::from_millis(10);

#[derive(Debug)]
pub struct RocksStore {
    db: Arc<DB>,
    write_lock: Mutex<()>,
}

impl RocksStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IssuanceError> {
        let path = path.as_ref();
        debug!("opening RocksStore path={}", path.display());
        let db = open_db_with_cfs(path)?;
        let store = Self { db: Arc::new(db), write_lock: Mutex::new(()) };
        store.check_schema_version()?;
        info!("RocksStore opened path={}", path.display());
        Ok(store)
    }

    /// Open (creating if needed) the store directory inside `data_dir`.
    pub fn open_in_dir(data_dir: impl AsRef<Path>) -> Result<Self, IssuanceError> {
        let dir = data_dir.as_ref();
        fs::create_dir_all(dir).map_err(|err| storage_err!("fs::create_dir_all open_in_dir", err))?;
        Self::open(dir.join(STORE_DIR_NAME))
    }

    /// Guard for the increment-and-insert critical section. Waiting is
    /// bounded by `STORAGE_LOCK_TIMEOUT_SECS`, so a stuck writer turns into a
    /// `StorageLockTimeout` before anything is staged.
    fn write_guard(&self, operation: &'static str) -> Result<MutexGuard<'_, ()>, IssuanceError> {
        lock_with_deadline(&self.write_lock, operation, Duration::from_secs(STORAGE_LOCK_TIMEOUT_SECS))
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily, IssuanceError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| storage_err!("cf_handle", format!("missing column family: {name}")))
    }

    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, IssuanceError> {
        Ok(bincode::serialize(value)?)
    }

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, IssuanceError> {
        Ok(bincode::deserialize(bytes)?)
    }

    fn key_u64(value: u64) -> [u8; 8] {
        value.to_be_bytes()
    }

    fn decode_u64(bytes: &[u8], what: &str) -> Result<u64, IssuanceError> {
        let array: [u8; 8] =
            bytes.try_into().map_err(|_| storage_err!("decode", format!("corrupt {what} value")))?;
        Ok(u64::from_be_bytes(array))
    }

    fn check_schema_version(&self) -> Result<(), IssuanceError> {
        let cf = self.cf_handle(CF_METADATA)?;
        match self.db.get_cf(cf, KEY_SCHEMA_VERSION).map_err(|err| storage_err!("rocksdb", err))? {
            None => {
                self.db
                    .put_cf(cf, KEY_SCHEMA_VERSION, SCHEMA_VERSION.to_be_bytes())
                    .map_err(|err| storage_err!("rocksdb", err))?;
                Ok(())
            }
            Some(bytes) => {
                let array: [u8; 4] =
                    bytes.as_slice().try_into().map_err(|_| storage_err!("decode", "corrupt schema version"))?;
                let stored = u32::from_be_bytes(array);
                if stored != SCHEMA_VERSION {
                    return Err(IssuanceError::SchemaMismatch { stored, current: SCHEMA_VERSION });
                }
                Ok(())
            }
        }
    }

    fn read_counter(&self, prefix: &Prefix) -> Result<u64, IssuanceError> {
        let cf = self.cf_handle(CF_COUNTER)?;
        match self.db.get_cf(cf, prefix.to_string().as_bytes()).map_err(|err| storage_err!("rocksdb", err))? {
            None => Ok(0),
            Some(bytes) => Self::decode_u64(&bytes, "counter"),
        }
    }

    fn read_next_certificate_id(&self) -> Result<u64, IssuanceError> {
        let cf = self.cf_handle(CF_METADATA)?;
        match self.db.get_cf(cf, KEY_NEXT_CERTIFICATE_ID).map_err(|err| storage_err!("rocksdb", err))? {
            None => Ok(1),
            Some(bytes) => Self::decode_u64(&bytes, "next certificate id"),
        }
    }

    fn control_number_exists(&self, control_number: &ControlNumber) -> Result<bool, IssuanceError> {
        let cf = self.cf_handle(CF_CONTROL_NUMBER)?;
        Ok(self
            .db
            .get_cf(cf, control_number.to_string().as_bytes())
            .map_err(|err| storage_err!("rocksdb", err))?
            .is_some())
    }

    /// Stage record + control-number index + id bump (and optionally the
    /// counter) into one batch, then commit it. Caller holds `write_lock`.
    fn commit_record(
        &self,
        control_number: ControlNumber,
        draft: CertificateDraft,
        counter_value: Option<u64>,
    ) -> Result<IssuedCertificate, IssuanceError> {
        let next_id = self.read_next_certificate_id()?;
        let record = IssuedCertificate::from_draft(CertificateId::new(next_id), control_number, draft, now_nanos());

        let mut batch = WriteBatch::default();
        if let Some(value) = counter_value {
            batch.put_cf(
                self.cf_handle(CF_COUNTER)?,
                record.control_number.prefix().to_string().as_bytes(),
                Self::key_u64(value),
            );
        }
        batch.put_cf(self.cf_handle(CF_CERTIFICATE)?, Self::key_u64(next_id), Self::encode(&record)?);
        batch.put_cf(
            self.cf_handle(CF_CONTROL_NUMBER)?,
            record.control_number.to_string().as_bytes(),
            Self::key_u64(next_id),
        );
        batch.put_cf(self.cf_handle(CF_METADATA)?, KEY_NEXT_CERTIFICATE_ID, Self::key_u64(next_id + 1));
        self.db.write(batch).map_err(|err| storage_err!("rocksdb write", err))?;

        debug!("certificate stored id={} control_number={}", record.id, record.control_number);
        Ok(record)
    }
}

fn lock_with_deadline<'a, T>(
    lock: &'a Mutex<T>,
    operation: &'static str,
    wait_for: Duration,
) -> Result<MutexGuard<'a, T>, IssuanceError> {
    let deadline = Instant::now() + wait_for;
    loop {
        match lock.try_lock() {
            Ok(guard) => return Ok(guard),
            Err(TryLockError::Poisoned(_)) => return Err(storage_err!(operation, "write lock poisoned")),
            Err(TryLockError::WouldBlock) => {
                if Instant::now() >= deadline {
                    return Err(IssuanceError::StorageLockTimeout {
                        operation: operation.to_string(),
                        timeout_secs: wait_for.as_secs(),
                    });
                }
                std::thread::sleep(WRITE_LOCK_POLL);
            }
        }
    }
}

fn open_db_with_cfs(path: impl AsRef<Path>) -> Result<DB, IssuanceError> {
    let mut options = RocksOptions::default();
    options.create_if_missing(true);
    options.create_missing_column_families(true);
    options.set_use_fsync(true);
    options.set_paranoid_checks(true);
    options.optimize_for_point_lookup(64);

    let cfs: Vec<ColumnFamilyDescriptor> = ALL_COLUMN_FAMILIES
        .iter()
        .map(|name| ColumnFamilyDescriptor::new(*name, RocksOptions::default()))
        .collect();

    DB::open_cf_descriptors(&options, path, cfs)
        .map_err(|err| storage_err!("rocksdb open_cf_descriptors", err))
}

impl CertificateStore for RocksStore {
    fn upsert_certificate_type(&self, cert_type: CertificateType) -> Result<(), IssuanceError> {
        trace!("upsert_certificate_type id={}", cert_type.id);
        let _guard = self.write_guard("upsert certificate type")?;
        let cf = self.cf_handle(CF_CERTIFICATE_TYPE)?;
        let value = Self::encode(&cert_type)?;
        self.db
            .put_cf(cf, Self::key_u64(cert_type.id.as_u64()), value)
            .map_err(|err| storage_err!("rocksdb", err))
    }

    fn get_certificate_type(&self, id: CertificateTypeId) -> Result<Option<CertificateType>, IssuanceError> {
        let cf = self.cf_handle(CF_CERTIFICATE_TYPE)?;
        let value = self.db.get_cf(cf, Self::key_u64(id.as_u64())).map_err(|err| storage_err!("rocksdb", err))?;
        match value {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn list_certificate_types(&self) -> Result<Vec<CertificateType>, IssuanceError> {
        let cf = self.cf_handle(CF_CERTIFICATE_TYPE)?;
        let mut types = Vec::new();
        for entry in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = entry.map_err(|err| storage_err!("rocksdb iterator", err))?;
            types.push(Self::decode(&value)?);
        }
        Ok(types)
    }

    fn get_certificate(&self, id: CertificateId) -> Result<Option<IssuedCertificate>, IssuanceError> {
        let cf = self.cf_handle(CF_CERTIFICATE)?;
        let value = self.db.get_cf(cf, Self::key_u64(id.as_u64())).map_err(|err| storage_err!("rocksdb", err))?;
        match value {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn get_certificate_by_control_number(
        &self,
        control_number: &ControlNumber,
    ) -> Result<Option<IssuedCertificate>, IssuanceError> {
        let cf = self.cf_handle(CF_CONTROL_NUMBER)?;
        let value = self
            .db
            .get_cf(cf, control_number.to_string().as_bytes())
            .map_err(|err| storage_err!("rocksdb", err))?;
        match value {
            None => Ok(None),
            Some(bytes) => self.get_certificate(CertificateId::new(Self::decode_u64(&bytes, "control number index")?)),
        }
    }

    fn list_certificates_for_prefix(&self, prefix: &Prefix) -> Result<Vec<IssuedCertificate>, IssuanceError> {
        let cf = self.cf_handle(CF_CONTROL_NUMBER)?;
        let prefix_bytes = prefix.to_string().into_bytes();
        let mut records = Vec::new();
        for entry in self.db.prefix_iterator_cf(cf, &prefix_bytes) {
            let (key, value) = entry.map_err(|err| storage_err!("rocksdb iterator", err))?;
            if !key.starts_with(&prefix_bytes) {
                break;
            }
            let id = CertificateId::new(Self::decode_u64(&value, "control number index")?);
            if let Some(record) = self.get_certificate(id)? {
                records.push(record);
            }
        }
        records.sort_by_key(|c| c.control_number.sequence());
        Ok(records)
    }

    fn insert_with_next_sequence(
        &self,
        prefix: &Prefix,
        draft: CertificateDraft,
    ) -> Result<IssuedCertificate, IssuanceError> {
        let _guard = self.write_guard("certificate insert")?;

        let last = self.read_counter(prefix)?;
        let next = last + 1;
        let sequence = u32::try_from(next).map_err(|_| IssuanceError::StoreUnavailable {
            operation: "counter advance".to_string(),
            details: format!("sequence overflow for prefix {prefix}"),
        })?;
        let control_number = ControlNumber::new(prefix.clone(), sequence)?;
        if self.control_number_exists(&control_number)? {
            // Counter behind the uniqueness index means the store is corrupt.
            return Err(IssuanceError::StoreUnavailable {
                operation: "counter advance".to_string(),
                details: format!("control number {control_number} exists ahead of counter"),
            });
        }
        self.commit_record(control_number, draft, Some(next))
    }

    fn max_sequence_for_prefix(&self, prefix: &Prefix) -> Result<Option<u32>, IssuanceError> {
        let cf = self.cf_handle(CF_CONTROL_NUMBER)?;
        let prefix_str = prefix.to_string();
        let prefix_bytes = prefix_str.as_bytes();
        let mut max = None;
        for entry in self.db.prefix_iterator_cf(cf, prefix_bytes) {
            let (key, _) = entry.map_err(|err| storage_err!("rocksdb iterator", err))?;
            if !key.starts_with(prefix_bytes) {
                break;
            }
            // Trailing numeric segment of the control number string.
            if let Some(sequence) =
                std::str::from_utf8(&key[prefix_bytes.len()..]).ok().and_then(|tail| tail.parse::<u32>().ok())
            {
                max = Some(max.map_or(sequence, |m: u32| m.max(sequence)));
            }
        }
        Ok(max)
    }

    fn insert_if_control_number_free(
        &self,
        control_number: &ControlNumber,
        draft: CertificateDraft,
    ) -> Result<Option<IssuedCertificate>, IssuanceError> {
        let _guard = self.write_guard("certificate insert")?;

        if self.control_number_exists(control_number)? {
            return Ok(None);
        }
        // Keep the counter at least as high as any directly inserted sequence
        // so both allocation strategies can share the store.
        let last = self.read_counter(control_number.prefix())?;
        let floor = u64::from(control_number.sequence());
        let counter_value = if last < floor { Some(floor) } else { None };
        self.commit_record(control_number.clone(), draft, counter_value).map(Some)
    }

    fn last_allocated_sequence(&self, prefix: &Prefix) -> Result<Option<u64>, IssuanceError> {
        let cf = self.cf_handle(CF_COUNTER)?;
        match self.db.get_cf(cf, prefix.to_string().as_bytes()).map_err(|err| storage_err!("rocksdb", err))? {
            None => Ok(None),
            Some(bytes) => Ok(Some(Self::decode_u64(&bytes, "counter")?)),
        }
    }

    fn health_check(&self) -> Result<(), IssuanceError> {
        self.cf_handle(CF_METADATA).map(|_| ())
    }
}
