//! Admission state machine.
//!
//! `pending → approved | rejected`, one way. Each decision is one atomic
//! store write (conditional on the record still being pending) followed by
//! an ordered list of best-effort effects:
//!
//! | decision | mandatory write                                   | effects, in order |
//! |----------|---------------------------------------------------|-------------------|
//! | approve  | allocate id + create identity + mark approved     | acceptance notice |
//! | reject   | mark rejected with reason                         | rejection notice, delete photo, delete documents |

use std::sync::Arc;

use matric_store::{
    AdmissionStore, ApplicantProfile, ApplicantRecord, ApprovalGrant, NewApplicant,
    NewIdentity, RejectionGrant,
};
use matric_types::{ApplicantId, ApplicantStatus, AssignedId, Clock, IdentityId, Role};
use tracing::info;

use crate::effects::{Effect, EffectReport, EffectRunner};
use crate::{AdmissionError, CredentialIssuer, IdentifierAllocator};

/// Result of a successful approval.
#[derive(Clone, Debug)]
pub struct Approval {
    pub applicant: ApplicantId,
    pub assigned_id: AssignedId,
    pub identity: IdentityId,
    pub effects: EffectReport,
}

/// Result of a successful rejection.
#[derive(Clone, Debug)]
pub struct Rejection {
    pub applicant: ApplicantId,
    pub status: ApplicantStatus,
    pub effects: EffectReport,
}

pub struct AdmissionMachine {
    store: Arc<dyn AdmissionStore>,
    clock: Arc<dyn Clock>,
    allocator: IdentifierAllocator,
    issuer: CredentialIssuer,
    effects: EffectRunner,
}

impl AdmissionMachine {
    pub fn new(
        store: Arc<dyn AdmissionStore>,
        clock: Arc<dyn Clock>,
        allocator: IdentifierAllocator,
        issuer: CredentialIssuer,
        effects: EffectRunner,
    ) -> Self {
        Self {
            store,
            clock,
            allocator,
            issuer,
            effects,
        }
    }

    /// Record a new application in the pending state.
    pub fn submit(
        &self,
        profile: ApplicantProfile,
        photo_ref: Option<String>,
        document_refs: Vec<String>,
    ) -> Result<ApplicantRecord, AdmissionError> {
        let record = self.store.insert_applicant(NewApplicant {
            profile,
            photo_ref,
            document_refs,
            submitted_at: self.clock.now(),
        })?;
        info!(applicant = %record.id, "application submitted");
        Ok(record)
    }

    fn load_pending(&self, id: ApplicantId) -> Result<ApplicantRecord, AdmissionError> {
        let record = self.store.get_applicant(id)?;
        if record.status != ApplicantStatus::Pending {
            return Err(AdmissionError::AlreadyProcessed {
                applicant: id.to_string(),
                status: record.status,
            });
        }
        Ok(record)
    }

    /// Admit a pending applicant.
    ///
    /// The identifier, the new member identity and the status change commit
    /// together; a lost identifier race restarts allocation, a lost status
    /// race fails with [`AdmissionError::AlreadyProcessed`]. The acceptance
    /// notice is sent afterwards and its failure does not undo anything.
    pub fn approve(&self, id: ApplicantId, admin: IdentityId) -> Result<Approval, AdmissionError> {
        let applicant = self.load_pending(id)?;

        let secret = self.issuer.issue_temporary_secret();
        let secret_hash = self.issuer.hash(secret.expose())?;
        let now = self.clock.now();

        let (assigned_id, commit) = self.allocator.allocate_with(|candidate| {
            let grant = ApprovalGrant {
                assigned_id: candidate.clone(),
                identity: NewIdentity {
                    contact: applicant.profile.contact.clone(),
                    role: Role::Member,
                    secret_hash: secret_hash.clone(),
                    assigned_id: Some(candidate.clone()),
                    active: true,
                    created_at: now,
                },
                processed_at: now,
                processed_by: admin,
            };
            self.store
                .approve_applicant(id, &grant)
                .map(|commit| (candidate.clone(), commit))
        })?;
        info!(
            applicant = %id,
            identity = %commit.identity.id,
            assigned_id = %assigned_id,
            admin = %admin,
            "applicant approved"
        );

        let effects = self.effects.run(vec![Effect::NotifyAcceptance {
            contact: commit.identity.contact.clone(),
            assigned_id: assigned_id.clone(),
            secret,
        }]);

        Ok(Approval {
            applicant: id,
            assigned_id,
            identity: commit.identity.id,
            effects,
        })
    }

    /// Turn down a pending applicant and clean up their stored artifacts.
    pub fn reject(
        &self,
        id: ApplicantId,
        admin: IdentityId,
        reason: &str,
    ) -> Result<Rejection, AdmissionError> {
        self.load_pending(id)?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AdmissionError::EmptyReason);
        }

        let record = self.store.reject_applicant(
            id,
            &RejectionGrant {
                reason: reason.to_string(),
                processed_at: self.clock.now(),
                processed_by: admin,
            },
        )?;
        info!(applicant = %id, admin = %admin, "applicant rejected");

        let mut effects = vec![Effect::NotifyRejection {
            contact: record.profile.contact.clone(),
            reason: reason.to_string(),
        }];
        effects.extend(
            record
                .photo_ref
                .iter()
                .chain(record.document_refs.iter())
                .map(|reference| Effect::DeleteDocument {
                    reference: reference.clone(),
                }),
        );
        let effects = self.effects.run(effects);

        Ok(Rejection {
            applicant: id,
            status: record.status,
            effects,
        })
    }
}
