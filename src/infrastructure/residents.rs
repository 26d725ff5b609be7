//! Resident lookup collaborator.
//!
//! The resident registry is owned by the surrounding application; the
//! issuance core only needs a display name for activity-log text. A miss or
//! a lookup failure degrades to `ID:<resident_id>` rather than failing the
//! issuance.

use crate::foundation::{IssuanceError, ResidentId};
use log::debug;
use std::collections::HashMap;

pub trait ResidentDirectory: Send + Sync {
    fn display_name(&self, resident_id: ResidentId) -> Result<Option<String>, IssuanceError>;
}

/// Resolve a display name, degrading to `ID:<resident_id>` on a miss or error.
pub fn display_name_or_id(directory: &dyn ResidentDirectory, resident_id: ResidentId) -> String {
    match directory.display_name(resident_id) {
        Ok(Some(name)) if !name.trim().is_empty() => name,
        Ok(_) => format!("ID:{resident_id}"),
        Err(err) => {
            debug!("resident lookup failed resident_id={resident_id}: {err}");
            format!("ID:{resident_id}")
        }
    }
}

/// Map-backed directory for tests and embedded use.
#[derive(Default)]
pub struct StaticResidentDirectory {
    names: HashMap<u64, String>,
}

impl StaticResidentDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resident(mut self, resident_id: u64, name: impl Into<String>) -> Self {
        self.names.insert(resident_id, name.into());
        self
    }
}

impl ResidentDirectory for StaticResidentDirectory {
    fn display_name(&self, resident_id: ResidentId) -> Result<Option<String>, IssuanceError> {
        Ok(self.names.get(&resident_id.as_u64()).cloned())
    }
}
