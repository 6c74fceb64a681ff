//! Identity record, its recovery challenge slot, and the storage trait.

use crate::StoreError;
use matric_types::{AssignedId, ChallengeState, ContactAddress, IdentityId, Role, Timestamp};
use serde::{Deserialize, Serialize};

/// Recovery challenge slot of an identity.
///
/// Codes and tokens are held as digests only. At most one of the code and
/// the token is live: issuing either clears the other.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryChallenge {
    pub code_digest: Option<String>,
    pub code_expires_at: Option<Timestamp>,
    /// Wrong codes submitted against the current code.
    pub code_attempts: u32,
    pub token_digest: Option<String>,
    pub token_expires_at: Option<Timestamp>,
}

impl RecoveryChallenge {
    pub fn state(&self) -> ChallengeState {
        if self.code_digest.is_some() {
            ChallengeState::CodeIssued
        } else if self.token_digest.is_some() {
            ChallengeState::TokenIssued
        } else {
            ChallengeState::None
        }
    }

    /// Replace whatever is live with a fresh code.
    pub fn issue_code(&mut self, digest: String, expires_at: Timestamp) {
        *self = Self {
            code_digest: Some(digest),
            code_expires_at: Some(expires_at),
            ..Self::default()
        };
    }

    /// Consume the code and replace it with a reset token.
    pub fn issue_token(&mut self, digest: String, expires_at: Timestamp) {
        *self = Self {
            token_digest: Some(digest),
            token_expires_at: Some(expires_at),
            ..Self::default()
        };
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// One account holder (administrator or admitted member).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub id: IdentityId,
    /// Unique across all identities.
    pub contact: ContactAddress,
    pub role: Role,
    /// Argon2id PHC string.
    pub secret_hash: String,
    /// Unique when present; shares its value space with applicant records.
    pub assigned_id: Option<AssignedId>,
    pub active: bool,
    pub last_access_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub recovery: RecoveryChallenge,
    /// Bumped by every write; guards revision-checked updates.
    pub revision: u64,
}

impl IdentityRecord {
    pub fn from_new(id: IdentityId, new: NewIdentity) -> Self {
        Self {
            id,
            contact: new.contact,
            role: new.role,
            secret_hash: new.secret_hash,
            assigned_id: new.assigned_id,
            active: new.active,
            last_access_at: None,
            created_at: new.created_at,
            recovery: RecoveryChallenge::default(),
            revision: 0,
        }
    }

    /// Copy the mutable fields of `update` onto this record and bump the
    /// revision. Id, contact, role and assigned id never change here, and
    /// `last_access_at` is only written by [`IdentityStore::record_access`].
    pub fn merge_update(&mut self, update: &IdentityRecord) {
        self.secret_hash = update.secret_hash.clone();
        self.active = update.active;
        self.recovery = update.recovery.clone();
        self.revision += 1;
    }
}

/// An identity before the store has assigned it an id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewIdentity {
    pub contact: ContactAddress,
    pub role: Role,
    pub secret_hash: String,
    pub assigned_id: Option<AssignedId>,
    pub active: bool,
    pub created_at: Timestamp,
}

/// Trait for identity storage operations.
pub trait IdentityStore {
    /// Persist a new identity, enforcing contact and assigned-id uniqueness.
    fn insert_identity(&self, new: NewIdentity) -> Result<IdentityRecord, StoreError>;

    fn get_identity(&self, id: IdentityId) -> Result<IdentityRecord, StoreError>;

    /// Look up the identity holding `contact`, if any.
    fn find_identity(&self, contact: &ContactAddress) -> Result<Option<IdentityRecord>, StoreError>;

    fn iter_identities(&self) -> Result<Vec<IdentityRecord>, StoreError>;

    fn identity_count(&self) -> Result<u64, StoreError>;

    /// Write the mutable fields of `record` if the stored revision still
    /// equals `record.revision`, otherwise fail with [`StoreError::Stale`].
    fn update_identity(&self, record: &IdentityRecord) -> Result<IdentityRecord, StoreError>;

    /// Overwrite only the recovery slot, unconditionally (last write wins).
    fn put_recovery(
        &self,
        id: IdentityId,
        challenge: &RecoveryChallenge,
    ) -> Result<IdentityRecord, StoreError>;

    /// Stamp a successful credential check, unconditionally. The later of the
    /// stored and given times is kept and the revision is left alone, so
    /// concurrent logins never make a revision-checked writer stale.
    fn record_access(&self, id: IdentityId, at: Timestamp) -> Result<IdentityRecord, StoreError>;
}
