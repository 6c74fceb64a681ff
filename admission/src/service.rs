//! The admission core as seen by a routing layer.

use std::sync::Arc;

use matric_crypto::Secret;
use matric_store::{AdmissionStore, ApplicantProfile, ApplicantRecord, IdentityRecord};
use matric_types::{
    AdmissionParams, ApplicantId, AssignedId, Clock, ContactAddress, IdentityId, Role,
};

use crate::credentials::Provisioned;
use crate::effects::{EffectReport, EffectRunner};
use crate::machine::{Approval, Rejection};
use crate::{
    AdmissionError, AdmissionMachine, CredentialIssuer, DocumentStore, IdentifierAllocator,
    Notifier, RecoveryFlow,
};

/// Wires the allocator, state machine, credential issuer and recovery flow
/// onto one store and one set of collaborators.
pub struct AdmissionCore {
    store: Arc<dyn AdmissionStore>,
    clock: Arc<dyn Clock>,
    allocator: IdentifierAllocator,
    issuer: CredentialIssuer,
    machine: AdmissionMachine,
    recovery: RecoveryFlow,
}

impl AdmissionCore {
    pub fn new(
        store: Arc<dyn AdmissionStore>,
        notifier: Arc<dyn Notifier>,
        documents: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        params: &AdmissionParams,
    ) -> Result<Self, AdmissionError> {
        params.validate()?;
        let effects = EffectRunner::new(notifier, documents);
        let allocator = IdentifierAllocator::new(store.clone(), params);
        let issuer = CredentialIssuer::new(store.clone(), clock.clone(), effects.clone(), params)?;
        let machine = AdmissionMachine::new(
            store.clone(),
            clock.clone(),
            allocator.clone(),
            issuer.clone(),
            effects.clone(),
        );
        let recovery = RecoveryFlow::new(
            store.clone(),
            clock.clone(),
            issuer.clone(),
            effects,
            params,
        );
        Ok(Self {
            store,
            clock,
            allocator,
            issuer,
            machine,
            recovery,
        })
    }

    // ── Allocation ───────────────────────────────────────────────────────

    pub fn allocate(&self) -> Result<AssignedId, AdmissionError> {
        self.allocator.allocate(self.clock.now())
    }

    // ── Admission ────────────────────────────────────────────────────────

    pub fn submit(
        &self,
        profile: ApplicantProfile,
        photo_ref: Option<String>,
        document_refs: Vec<String>,
    ) -> Result<ApplicantRecord, AdmissionError> {
        self.machine.submit(profile, photo_ref, document_refs)
    }

    pub fn approve(&self, applicant: ApplicantId, admin: IdentityId) -> Result<Approval, AdmissionError> {
        self.machine.approve(applicant, admin)
    }

    pub fn reject(
        &self,
        applicant: ApplicantId,
        admin: IdentityId,
        reason: &str,
    ) -> Result<Rejection, AdmissionError> {
        self.machine.reject(applicant, admin, reason)
    }

    // ── Recovery ─────────────────────────────────────────────────────────

    pub fn request_code(&self, contact: &ContactAddress, role: Role) -> Result<(), AdmissionError> {
        self.recovery.request_code(contact, role)
    }

    pub fn verify_code(
        &self,
        contact: &ContactAddress,
        role: Role,
        code: &str,
    ) -> Result<Secret, AdmissionError> {
        self.recovery.verify_code(contact, role, code)
    }

    pub fn reset_secret(
        &self,
        contact: &ContactAddress,
        role: Role,
        token: &str,
        new_secret: &str,
    ) -> Result<(), AdmissionError> {
        self.recovery.reset_secret(contact, role, token, new_secret)
    }

    // ── Accounts ─────────────────────────────────────────────────────────

    pub fn provision(&self, contact: ContactAddress, role: Role) -> Result<Provisioned, AdmissionError> {
        self.issuer.provision(&self.allocator, contact, role)
    }

    pub fn reissue_credentials(
        &self,
        identity: IdentityId,
    ) -> Result<(IdentityRecord, EffectReport), AdmissionError> {
        self.issuer.reissue(identity)
    }

    pub fn authenticate(
        &self,
        contact: &ContactAddress,
        role: Role,
        secret: &str,
    ) -> Result<IdentityRecord, AdmissionError> {
        self.issuer.authenticate(contact, role, secret)
    }

    pub fn set_active(&self, identity: IdentityId, active: bool) -> Result<IdentityRecord, AdmissionError> {
        self.issuer.set_active(identity, active)
    }

    // ── Reads ────────────────────────────────────────────────────────────

    pub fn applicant(&self, id: ApplicantId) -> Result<ApplicantRecord, AdmissionError> {
        Ok(self.store.get_applicant(id)?)
    }

    pub fn identity(&self, id: IdentityId) -> Result<IdentityRecord, AdmissionError> {
        Ok(self.store.get_identity(id)?)
    }

    pub fn find_identity(
        &self,
        contact: &ContactAddress,
        role: Role,
    ) -> Result<Option<IdentityRecord>, AdmissionError> {
        Ok(self
            .store
            .find_identity(contact)?
            .filter(|record| record.role == role))
    }

    pub fn current_max_identifier(&self) -> Result<u64, AdmissionError> {
        self.allocator.current_max()
    }
}
