//! Sequence allocation strategies.
//!
//! Both strategies delegate the actual mutation to the store so the counter
//! advance and the record insert commit atomically (see the module docs in
//! `storage`). The durable counter is the default: it needs no retries and
//! has no read-then-write window. The optimistic scan reproduces the legacy
//! "SELECT MAX then INSERT" numbering observably, but closes its race by
//! re-scanning and retrying when the proposed number is already taken.

use crate::domain::control_number::{ControlNumber, Prefix};
use crate::domain::model::{CertificateDraft, IssuedCertificate};
use crate::foundation::IssuanceError;
use crate::infrastructure::storage::CertificateStore;
use log::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocationStrategy {
    /// Per-prefix durable counter advanced inside the insert transaction.
    DurableCounter,
    /// Scan existing control numbers for the max, propose max+1, retry on
    /// collision up to `retry_budget` attempts.
    OptimisticScan { retry_budget: u32 },
}

impl Default for AllocationStrategy {
    fn default() -> Self {
        AllocationStrategy::DurableCounter
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SequenceAllocator {
    strategy: AllocationStrategy,
}

impl SequenceAllocator {
    pub fn new(strategy: AllocationStrategy) -> Self {
        Self { strategy }
    }

    pub fn durable_counter() -> Self {
        Self::new(AllocationStrategy::DurableCounter)
    }

    pub fn optimistic(retry_budget: u32) -> Self {
        Self::new(AllocationStrategy::OptimisticScan { retry_budget })
    }

    pub fn strategy(&self) -> AllocationStrategy {
        self.strategy
    }

    /// Allocate the next sequence for `prefix` and persist the record in the
    /// same atomic unit. Never hands out the same sequence twice for one
    /// prefix.
    pub fn issue(
        &self,
        store: &dyn CertificateStore,
        prefix: &Prefix,
        draft: CertificateDraft,
    ) -> Result<IssuedCertificate, IssuanceError> {
        match self.strategy {
            AllocationStrategy::DurableCounter => {
                let record = store.insert_with_next_sequence(prefix, draft)?;
                debug!("allocated control_number={} via durable counter", record.control_number);
                Ok(record)
            }
            AllocationStrategy::OptimisticScan { retry_budget } => self.issue_optimistic(store, prefix, draft, retry_budget),
        }
    }

    fn issue_optimistic(
        &self,
        store: &dyn CertificateStore,
        prefix: &Prefix,
        draft: CertificateDraft,
        retry_budget: u32,
    ) -> Result<IssuedCertificate, IssuanceError> {
        let retry_budget = retry_budget.max(1);
        for attempt in 1..=retry_budget {
            let last = store.max_sequence_for_prefix(prefix)?.unwrap_or(0);
            let candidate = ControlNumber::new(prefix.clone(), last + 1)?;
            match store.insert_if_control_number_free(&candidate, draft.clone())? {
                Some(record) => {
                    debug!(
                        "allocated control_number={} via optimistic scan attempt={}/{}",
                        record.control_number, attempt, retry_budget
                    );
                    return Ok(record);
                }
                None => {
                    debug!(
                        "control number {} taken by concurrent issuance, rescanning attempt={}/{}",
                        candidate, attempt, retry_budget
                    );
                }
            }
        }
        warn!("allocation retries exhausted prefix={prefix} attempts={retry_budget}");
        Err(IssuanceError::AllocationExhausted { prefix: prefix.to_string(), attempts: retry_budget })
    }
}
