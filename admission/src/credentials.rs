//! Credential issuer: temporary secrets, account provisioning and
//! credential checks.
//!
//! Plaintext secrets leave this module exactly once, inside a notification
//! effect. Only their Argon2id hash is persisted.

use std::sync::Arc;

use matric_crypto::{check_strength, generate_temporary_secret, Secret, SecretHasher};
use matric_store::{AdmissionStore, IdentityRecord, NewIdentity};
use matric_types::{AdmissionParams, AssignedId, Clock, ContactAddress, IdentityId, Role};
use tracing::{debug, info};

use crate::effects::{Effect, EffectReport, EffectRunner};
use crate::{AdmissionError, IdentifierAllocator};

/// An account created by administrator provisioning.
#[derive(Clone, Debug)]
pub struct Provisioned {
    pub identity: IdentityRecord,
    pub effects: EffectReport,
}

/// Issues, hashes and checks account secrets.
#[derive(Clone)]
pub struct CredentialIssuer {
    store: Arc<dyn AdmissionStore>,
    clock: Arc<dyn Clock>,
    effects: EffectRunner,
    hasher: SecretHasher,
    secret_len: usize,
    min_secret_len: usize,
}

impl CredentialIssuer {
    pub fn new(
        store: Arc<dyn AdmissionStore>,
        clock: Arc<dyn Clock>,
        effects: EffectRunner,
        params: &AdmissionParams,
    ) -> Result<Self, AdmissionError> {
        Ok(Self {
            store,
            clock,
            effects,
            hasher: SecretHasher::new(params.hash_memory_kib, params.hash_iterations)?,
            secret_len: params.temporary_secret_len,
            min_secret_len: params.min_secret_len,
        })
    }

    /// Generate a temporary secret with every character class present.
    pub fn issue_temporary_secret(&self) -> Secret {
        generate_temporary_secret(&mut rand::thread_rng(), self.secret_len)
    }

    pub fn hash(&self, secret: &str) -> Result<String, AdmissionError> {
        Ok(self.hasher.hash(secret)?)
    }

    pub fn verify(&self, secret: &str, stored_hash: &str) -> bool {
        self.hasher.verify(secret, stored_hash)
    }

    /// Reject secrets below the minimum strength.
    pub fn check_strength(&self, secret: &str) -> Result<(), AdmissionError> {
        Ok(check_strength(secret, self.min_secret_len)?)
    }

    /// Create an account directly. Members draw an identifier from
    /// `allocator`; administrators carry none. The temporary secret goes
    /// out through `send_credentials`.
    pub fn provision(
        &self,
        allocator: &IdentifierAllocator,
        contact: ContactAddress,
        role: Role,
    ) -> Result<Provisioned, AdmissionError> {
        let secret = self.issue_temporary_secret();
        let secret_hash = self.hash(secret.expose())?;
        let now = self.clock.now();
        let new_identity = |assigned_id: Option<AssignedId>| NewIdentity {
            contact: contact.clone(),
            role,
            secret_hash: secret_hash.clone(),
            assigned_id,
            active: true,
            created_at: now,
        };

        let identity = if role.carries_assigned_id() {
            allocator.allocate_with(|candidate| {
                self.store
                    .insert_identity(new_identity(Some(candidate.clone())))
            })?
        } else {
            self.store.insert_identity(new_identity(None))?
        };
        info!(identity = %identity.id, %role, "account provisioned");

        let effects = self.effects.run(vec![Effect::NotifyCredentials {
            contact: identity.contact.clone(),
            assigned_id: identity.assigned_id.clone(),
            secret,
        }]);
        Ok(Provisioned { identity, effects })
    }

    /// Replace an existing account's secret with a fresh temporary one and
    /// send it out.
    pub fn reissue(&self, id: IdentityId) -> Result<(IdentityRecord, EffectReport), AdmissionError> {
        let mut record = self.store.get_identity(id)?;
        let secret = self.issue_temporary_secret();
        record.secret_hash = self.hash(secret.expose())?;
        let record = self.store.update_identity(&record)?;
        info!(identity = %record.id, "credentials re-issued");

        let effects = self.effects.run(vec![Effect::NotifyCredentials {
            contact: record.contact.clone(),
            assigned_id: record.assigned_id.clone(),
            secret,
        }]);
        Ok((record, effects))
    }

    /// Check a secret for `(contact, role)` and record the access time.
    ///
    /// Unknown accounts, role mismatches and wrong secrets all report
    /// [`AdmissionError::InvalidCredentials`]. A disabled member is only
    /// told so after presenting the right secret.
    pub fn authenticate(
        &self,
        contact: &ContactAddress,
        role: Role,
        secret: &str,
    ) -> Result<IdentityRecord, AdmissionError> {
        let record = match self.store.find_identity(contact)? {
            Some(record) if record.role == role => record,
            _ => {
                debug!(%role, "credential check for unknown account");
                return Err(AdmissionError::InvalidCredentials);
            }
        };
        if !self.verify(secret, &record.secret_hash) {
            return Err(AdmissionError::InvalidCredentials);
        }
        if role == Role::Member && !record.active {
            return Err(AdmissionError::AccountDisabled);
        }
        Ok(self.store.record_access(record.id, self.clock.now())?)
    }

    pub fn set_active(&self, id: IdentityId, active: bool) -> Result<IdentityRecord, AdmissionError> {
        let mut record = self.store.get_identity(id)?;
        record.active = active;
        let record = self.store.update_identity(&record)?;
        info!(identity = %record.id, active, "account activation changed");
        Ok(record)
    }
}
