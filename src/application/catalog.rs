//! Read-only certificate type catalog.

use crate::domain::control_number::TypeCode;
use crate::domain::model::CertificateType;
use crate::foundation::{CertificateTypeId, IssuanceError};
use crate::infrastructure::storage::CertificateStore;
use log::warn;
use std::sync::Arc;

/// Lookup of certificate type metadata and the code derived from the type
/// name. Derivation is deterministic and side-effect free; it is not
/// collision-free across type names, which is fine because uniqueness is
/// enforced at the full control-number level.
#[derive(Clone)]
pub struct CertificateTypeCatalog {
    store: Arc<dyn CertificateStore>,
}

impl CertificateTypeCatalog {
    pub fn new(store: Arc<dyn CertificateStore>) -> Self {
        Self { store }
    }

    pub fn certificate_type(&self, id: CertificateTypeId) -> Result<Option<CertificateType>, IssuanceError> {
        self.store.get_certificate_type(id)
    }

    pub fn list(&self) -> Result<Vec<CertificateType>, IssuanceError> {
        self.store.list_certificate_types()
    }

    /// Resolve the control-number code for a type. A missing type falls back
    /// to `CERT` rather than failing; an inactive type still resolves (the
    /// issuance form is expected to filter, this core does not refuse).
    pub fn resolve_code(&self, id: CertificateTypeId) -> Result<TypeCode, IssuanceError> {
        match self.store.get_certificate_type(id)? {
            Some(cert_type) => {
                if !cert_type.is_active {
                    warn!("issuing against inactive certificate type id={id} name={:?}", cert_type.name);
                }
                Ok(TypeCode::derive(&cert_type.name))
            }
            None => {
                warn!("certificate type not found id={id}; using fallback code");
                Ok(TypeCode::fallback())
            }
        }
    }
}
