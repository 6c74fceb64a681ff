//! Applicant record and its storage trait.

use crate::identity::{IdentityRecord, NewIdentity};
use crate::StoreError;
use matric_types::{
    ApplicantId, ApplicantStatus, AssignedId, ContactAddress, IdentityId, Timestamp,
};
use serde::{Deserialize, Serialize};

/// Identity and academic fields submitted with an application.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantProfile {
    pub full_name: String,
    pub contact: ContactAddress,
    pub phone: Option<String>,
    /// ISO-8601 calendar date, as submitted.
    pub birth_date: String,
    pub program: String,
    pub previous_school: Option<String>,
}

/// One submitted application.
///
/// `assigned_id` is set iff the status is approved; `rejection_reason`
/// iff it is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantRecord {
    pub id: ApplicantId,
    pub profile: ApplicantProfile,
    /// Stored photo reference, owned by the document store.
    pub photo_ref: Option<String>,
    /// Supporting documents, owned by the document store.
    pub document_refs: Vec<String>,
    pub status: ApplicantStatus,
    pub assigned_id: Option<AssignedId>,
    pub rejection_reason: Option<String>,
    pub submitted_at: Timestamp,
    pub processed_at: Option<Timestamp>,
    pub processed_by: Option<IdentityId>,
}

impl ApplicantRecord {
    /// Build the pending record a backend persists for `new`.
    pub fn from_new(id: ApplicantId, new: NewApplicant) -> Self {
        Self {
            id,
            profile: new.profile,
            photo_ref: new.photo_ref,
            document_refs: new.document_refs,
            status: ApplicantStatus::Pending,
            assigned_id: None,
            rejection_reason: None,
            submitted_at: new.submitted_at,
            processed_at: None,
            processed_by: None,
        }
    }

    /// Whether the status/field invariants hold.
    pub fn is_consistent(&self) -> bool {
        let approved = self.status == ApplicantStatus::Approved;
        let rejected = self.status == ApplicantStatus::Rejected;
        self.assigned_id.is_some() == approved
            && self.rejection_reason.is_some() == rejected
            && self.processed_at.is_some() == self.status.is_terminal()
    }

    /// Apply an approval. Backends call this only after checking the status.
    pub fn apply_approval(&mut self, grant: &ApprovalGrant) {
        self.status = ApplicantStatus::Approved;
        self.assigned_id = Some(grant.assigned_id.clone());
        self.processed_at = Some(grant.processed_at);
        self.processed_by = Some(grant.processed_by);
    }

    /// Apply a rejection. Backends call this only after checking the status.
    pub fn apply_rejection(&mut self, grant: &RejectionGrant) {
        self.status = ApplicantStatus::Rejected;
        self.rejection_reason = Some(grant.reason.clone());
        self.processed_at = Some(grant.processed_at);
        self.processed_by = Some(grant.processed_by);
    }

    /// The error a backend returns when this record is no longer pending.
    pub fn status_conflict(&self) -> StoreError {
        StoreError::StatusConflict {
            key: self.id.to_string(),
            found: self.status,
        }
    }
}

/// A submission before the store has assigned it an id.
#[derive(Clone, Debug)]
pub struct NewApplicant {
    pub profile: ApplicantProfile,
    pub photo_ref: Option<String>,
    pub document_refs: Vec<String>,
    pub submitted_at: Timestamp,
}

/// Everything written by one approval.
#[derive(Clone, Debug)]
pub struct ApprovalGrant {
    pub assigned_id: AssignedId,
    /// Identity created for the admitted applicant; its `assigned_id`
    /// must equal the grant's.
    pub identity: NewIdentity,
    pub processed_at: Timestamp,
    pub processed_by: IdentityId,
}

/// Everything written by one rejection.
#[derive(Clone, Debug)]
pub struct RejectionGrant {
    pub reason: String,
    pub processed_at: Timestamp,
    pub processed_by: IdentityId,
}

/// Result of a committed approval.
#[derive(Clone, Debug)]
pub struct ApprovalCommit {
    pub applicant: ApplicantRecord,
    pub identity: IdentityRecord,
}

/// Trait for applicant storage operations.
pub trait ApplicantStore {
    /// Persist a new pending application.
    fn insert_applicant(&self, new: NewApplicant) -> Result<ApplicantRecord, StoreError>;

    fn get_applicant(&self, id: ApplicantId) -> Result<ApplicantRecord, StoreError>;

    fn iter_applicants(&self) -> Result<Vec<ApplicantRecord>, StoreError>;

    fn applicant_count(&self) -> Result<u64, StoreError>;

    /// Atomically approve a pending applicant.
    ///
    /// In one unit: fail with [`StoreError::StatusConflict`] unless the record
    /// is pending, fail with [`StoreError::Duplicate`] if the assigned id is
    /// already held anywhere or the identity contact is taken, otherwise
    /// insert the identity and mark the applicant approved. Nothing is
    /// written when any check fails.
    fn approve_applicant(
        &self,
        id: ApplicantId,
        grant: &ApprovalGrant,
    ) -> Result<ApprovalCommit, StoreError>;

    /// Atomically reject a pending applicant, failing with
    /// [`StoreError::StatusConflict`] if it is no longer pending.
    fn reject_applicant(
        &self,
        id: ApplicantId,
        grant: &RejectionGrant,
    ) -> Result<ApplicantRecord, StoreError>;
}
