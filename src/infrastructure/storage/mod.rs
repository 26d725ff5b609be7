//! Storage abstraction for the issuance core.
//!
//! `CertificateStore` is the only shared mutable resource in the system. Both
//! allocation designs are expressed as store primitives so that the counter
//! advance and the record insert always commit as one atomic unit; a bare
//! `allocate(prefix) -> u32` cannot be atomic with the insert that uses it.

pub mod allocator;
pub mod memory;
pub mod rocks;

pub use allocator::{AllocationStrategy, SequenceAllocator};
pub use memory::MemoryStore;
pub use rocks::RocksStore;

use crate::domain::control_number::{ControlNumber, Prefix};
use crate::domain::model::{CertificateDraft, CertificateType, IssuedCertificate};
use crate::foundation::{CertificateId, CertificateTypeId, IssuanceError};

pub type Result<T> = std::result::Result<T, IssuanceError>;

pub trait CertificateStore: Send + Sync {
    /// Seed or replace a catalog row. Catalog data is owned by configuration;
    /// the issuance path never calls this.
    fn upsert_certificate_type(&self, cert_type: CertificateType) -> Result<()>;
    fn get_certificate_type(&self, id: CertificateTypeId) -> Result<Option<CertificateType>>;
    fn list_certificate_types(&self) -> Result<Vec<CertificateType>>;

    fn get_certificate(&self, id: CertificateId) -> Result<Option<IssuedCertificate>>;
    fn get_certificate_by_control_number(&self, control_number: &ControlNumber) -> Result<Option<IssuedCertificate>>;

    /// All certificates sharing a prefix, ordered by sequence.
    fn list_certificates_for_prefix(&self, prefix: &Prefix) -> Result<Vec<IssuedCertificate>>;

    /// Durable-counter allocation: advance the per-prefix counter and persist
    /// the record as one atomic unit. Either the counter advances and the
    /// record exists afterward, or neither does.
    fn insert_with_next_sequence(&self, prefix: &Prefix, draft: CertificateDraft) -> Result<IssuedCertificate>;

    /// Optimistic-scan primitive: highest sequence among existing control
    /// numbers sharing the prefix, parsed from the trailing numeric segment.
    fn max_sequence_for_prefix(&self, prefix: &Prefix) -> Result<Option<u32>>;

    /// Optimistic-scan primitive: persist the record under the proposed
    /// control number unless it is already taken. Returns `Ok(None)` when a
    /// concurrent issuance won the number.
    ///
    /// Implementations must also raise the per-prefix counter to at least the
    /// inserted sequence so the two allocation strategies can coexist against
    /// one store without colliding.
    fn insert_if_control_number_free(
        &self,
        control_number: &ControlNumber,
        draft: CertificateDraft,
    ) -> Result<Option<IssuedCertificate>>;

    /// Last sequence the counter has handed out for a prefix. Diagnostics and
    /// no-partial-write assertions; `None` means the prefix has never been
    /// used.
    fn last_allocated_sequence(&self, prefix: &Prefix) -> Result<Option<u64>>;

    fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
