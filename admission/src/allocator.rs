//! Sequential identifier allocator.
//!
//! Optimistic concurrency over the store's uniqueness constraint: read the
//! highest identifier held anywhere, try to persist `max + 1`, and restart
//! from the read when the constraint reports that another writer got there
//! first. The constraint is the only guard; there is no lock.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use matric_store::{AdmissionStore, StoreError};
use matric_types::{AdmissionParams, AssignedId, Timestamp};
use tracing::{debug, error};

use crate::AdmissionError;

/// Hands out `PREFIX####` identifiers from the space shared by applicant
/// and identity records.
#[derive(Clone)]
pub struct IdentifierAllocator {
    store: Arc<dyn AdmissionStore>,
    prefix: String,
    width: usize,
    max_attempts: u32,
    retry_delay: Duration,
}

impl IdentifierAllocator {
    pub fn new(store: Arc<dyn AdmissionStore>, params: &AdmissionParams) -> Self {
        Self {
            store,
            prefix: params.id_prefix.clone(),
            width: params.id_width,
            max_attempts: params.allocation_max_attempts.max(1),
            retry_delay: Duration::from_millis(params.allocation_retry_delay_ms),
        }
    }

    /// Highest numeric identifier held by any applicant, identity or
    /// reservation. Values that are not `PREFIX + digits` count as zero.
    pub fn current_max(&self) -> Result<u64, AdmissionError> {
        let held = self.store.assigned_identifiers()?;
        Ok(held
            .iter()
            .map(|id| id.number(&self.prefix).unwrap_or(0))
            .max()
            .unwrap_or(0))
    }

    fn next_candidate(&self) -> Result<AssignedId, AdmissionError> {
        let next = self
            .current_max()?
            .checked_add(1)
            .ok_or(AdmissionError::AllocationExhausted { attempts: 0 })?;
        Ok(AssignedId::format(&self.prefix, next, self.width))
    }

    /// Allocate an identifier and persist it through `persist`.
    ///
    /// `persist` receives each candidate and must write it under the
    /// store's uniqueness constraint. A [`StoreError::Duplicate`] on the
    /// assigned id restarts from the read step after a fixed pause; any
    /// other error ends the allocation.
    pub fn allocate_with<T, F>(&self, mut persist: F) -> Result<T, AdmissionError>
    where
        F: FnMut(&AssignedId) -> Result<T, StoreError>,
    {
        for attempt in 1..=self.max_attempts {
            let candidate = self.next_candidate()?;
            match persist(&candidate) {
                Ok(value) => return Ok(value),
                Err(e) if e.is_identifier_conflict() => {
                    debug!(%candidate, attempt, "identifier taken by a concurrent writer");
                    if attempt < self.max_attempts && !self.retry_delay.is_zero() {
                        thread::sleep(self.retry_delay);
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
        error!(
            attempts = self.max_attempts,
            prefix = %self.prefix,
            "identifier allocation exhausted"
        );
        Err(AdmissionError::AllocationExhausted {
            attempts: self.max_attempts,
        })
    }

    /// Allocate a bare identifier, persisted as a reservation so no other
    /// record can ever receive it.
    pub fn allocate(&self, at: Timestamp) -> Result<AssignedId, AdmissionError> {
        self.allocate_with(|candidate| {
            self.store
                .reserve_identifier(candidate, at)
                .map(|()| candidate.clone())
        })
    }
}
