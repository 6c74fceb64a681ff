//! Nullable store: thread-safe in-memory storage.
//!
//! All state sits behind one mutex, so every trait method is a single
//! atomic unit: the pending check and the approval write cannot interleave
//! with another caller, and the identifier uniqueness check always sees
//! both record sets and the reservations together.

use matric_store::{
    ApplicantRecord, ApplicantStore, ApprovalCommit, ApprovalGrant, IdentifierStore,
    IdentityRecord, IdentityStore, NewApplicant, NewIdentity, RecoveryChallenge,
    RejectionGrant, StoreError, UniqueField,
};
use matric_types::{ApplicantId, ApplicantStatus, AssignedId, ContactAddress, IdentityId, Timestamp};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct State {
    applicants: BTreeMap<ApplicantId, ApplicantRecord>,
    identities: BTreeMap<IdentityId, IdentityRecord>,
    contacts: HashMap<ContactAddress, IdentityId>,
    reservations: BTreeMap<AssignedId, Timestamp>,
    last_applicant: u64,
    last_identity: u64,
    /// Commits that will lose an identifier race before touching any data.
    pending_races: u32,
    unavailable: bool,
}

impl State {
    fn identifier_taken(&self, id: &AssignedId) -> bool {
        self.reservations.contains_key(id)
            || self
                .applicants
                .values()
                .any(|a| a.assigned_id.as_ref() == Some(id))
            || self
                .identities
                .values()
                .any(|i| i.assigned_id.as_ref() == Some(id))
    }

    /// Fail with a uniqueness violation if `id` is held, after letting a
    /// simulated concurrent writer claim it first when one is armed.
    fn claim_identifier(&mut self, id: &AssignedId, at: Timestamp) -> Result<(), StoreError> {
        if self.pending_races > 0 {
            self.pending_races -= 1;
            self.reservations.insert(id.clone(), at);
        }
        if self.identifier_taken(id) {
            return Err(StoreError::Duplicate {
                field: UniqueField::AssignedId,
                value: id.to_string(),
            });
        }
        Ok(())
    }

    fn check_contact_free(&self, contact: &ContactAddress) -> Result<(), StoreError> {
        if self.contacts.contains_key(contact) {
            return Err(StoreError::Duplicate {
                field: UniqueField::Contact,
                value: contact.to_string(),
            });
        }
        Ok(())
    }

    fn push_identity(&mut self, new: NewIdentity) -> IdentityRecord {
        self.last_identity += 1;
        let record = IdentityRecord::from_new(IdentityId::new(self.last_identity), new);
        self.contacts.insert(record.contact.clone(), record.id);
        self.identities.insert(record.id, record.clone());
        record
    }

    fn pending_applicant(&self, id: ApplicantId) -> Result<&ApplicantRecord, StoreError> {
        let record = self
            .applicants
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if record.status != ApplicantStatus::Pending {
            return Err(record.status_conflict());
        }
        Ok(record)
    }
}

/// An in-memory applicant + identity + identifier store.
/// Thread-safe for use from many request handlers at once.
pub struct NullStore {
    state: Mutex<State>,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        let state = self
            .state
            .lock()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))?;
        if state.unavailable {
            return Err(StoreError::Unavailable("null store switched off".to_string()));
        }
        Ok(state)
    }

    /// Insert an applicant record verbatim, e.g. legacy data holding an
    /// identifier in a format the allocator does not produce.
    pub fn insert_raw_applicant(&self, record: ApplicantRecord) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.last_applicant = state.last_applicant.max(record.id.as_u64());
        state.applicants.insert(record.id, record);
        Ok(())
    }

    /// Make the next `count` identifier claims lose to a phantom concurrent
    /// writer that takes the candidate value first.
    pub fn simulate_identifier_races(&self, count: u32) {
        if let Ok(mut state) = self.state.lock() {
            state.pending_races = count;
        }
    }

    /// Make every call fail with [`StoreError::Unavailable`] until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.unavailable = unavailable;
        }
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicantStore for NullStore {
    fn insert_applicant(&self, new: NewApplicant) -> Result<ApplicantRecord, StoreError> {
        let mut state = self.lock()?;
        state.last_applicant += 1;
        let record = ApplicantRecord::from_new(ApplicantId::new(state.last_applicant), new);
        state.applicants.insert(record.id, record.clone());
        Ok(record)
    }

    fn get_applicant(&self, id: ApplicantId) -> Result<ApplicantRecord, StoreError> {
        self.lock()?
            .applicants
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn iter_applicants(&self) -> Result<Vec<ApplicantRecord>, StoreError> {
        Ok(self.lock()?.applicants.values().cloned().collect())
    }

    fn applicant_count(&self) -> Result<u64, StoreError> {
        Ok(self.lock()?.applicants.len() as u64)
    }

    fn approve_applicant(
        &self,
        id: ApplicantId,
        grant: &ApprovalGrant,
    ) -> Result<ApprovalCommit, StoreError> {
        let mut state = self.lock()?;
        state.pending_applicant(id)?;
        state.claim_identifier(&grant.assigned_id, grant.processed_at)?;
        state.check_contact_free(&grant.identity.contact)?;

        let identity = state.push_identity(grant.identity.clone());
        let applicant = state
            .applicants
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        applicant.apply_approval(grant);
        Ok(ApprovalCommit {
            applicant: applicant.clone(),
            identity,
        })
    }

    fn reject_applicant(
        &self,
        id: ApplicantId,
        grant: &RejectionGrant,
    ) -> Result<ApplicantRecord, StoreError> {
        let mut state = self.lock()?;
        state.pending_applicant(id)?;
        let applicant = state
            .applicants
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        applicant.apply_rejection(grant);
        Ok(applicant.clone())
    }
}

impl IdentityStore for NullStore {
    fn insert_identity(&self, new: NewIdentity) -> Result<IdentityRecord, StoreError> {
        let mut state = self.lock()?;
        if let Some(assigned) = &new.assigned_id {
            state.claim_identifier(assigned, new.created_at)?;
        }
        state.check_contact_free(&new.contact)?;
        Ok(state.push_identity(new))
    }

    fn get_identity(&self, id: IdentityId) -> Result<IdentityRecord, StoreError> {
        self.lock()?
            .identities
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn find_identity(&self, contact: &ContactAddress) -> Result<Option<IdentityRecord>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .contacts
            .get(contact)
            .and_then(|id| state.identities.get(id))
            .cloned())
    }

    fn iter_identities(&self) -> Result<Vec<IdentityRecord>, StoreError> {
        Ok(self.lock()?.identities.values().cloned().collect())
    }

    fn identity_count(&self) -> Result<u64, StoreError> {
        Ok(self.lock()?.identities.len() as u64)
    }

    fn update_identity(&self, record: &IdentityRecord) -> Result<IdentityRecord, StoreError> {
        let mut state = self.lock()?;
        let stored = state
            .identities
            .get_mut(&record.id)
            .ok_or_else(|| StoreError::NotFound(record.id.to_string()))?;
        if stored.revision != record.revision {
            return Err(StoreError::Stale(record.id.to_string()));
        }
        stored.merge_update(record);
        Ok(stored.clone())
    }

    fn put_recovery(
        &self,
        id: IdentityId,
        challenge: &RecoveryChallenge,
    ) -> Result<IdentityRecord, StoreError> {
        let mut state = self.lock()?;
        let stored = state
            .identities
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        stored.recovery = challenge.clone();
        stored.revision += 1;
        Ok(stored.clone())
    }

    fn record_access(&self, id: IdentityId, at: Timestamp) -> Result<IdentityRecord, StoreError> {
        let mut state = self.lock()?;
        let stored = state
            .identities
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        stored.last_access_at = stored.last_access_at.max(Some(at));
        Ok(stored.clone())
    }
}

impl IdentifierStore for NullStore {
    fn assigned_identifiers(&self) -> Result<Vec<AssignedId>, StoreError> {
        let state = self.lock()?;
        let held = state
            .applicants
            .values()
            .filter_map(|a| a.assigned_id.clone())
            .chain(state.identities.values().filter_map(|i| i.assigned_id.clone()))
            .chain(state.reservations.keys().cloned())
            .collect();
        Ok(held)
    }

    fn reserve_identifier(&self, id: &AssignedId, at: Timestamp) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.claim_identifier(id, at)?;
        state.reservations.insert(id.clone(), at);
        Ok(())
    }
}
