//! Abstract storage traits for the matric admission core.
//!
//! Every storage backend (LMDB, in-memory) implements these traits. The
//! admission crate depends only on the traits, never on a concrete store.
//!
//! Backends must provide two guarantees the core relies on:
//! - a uniqueness constraint on assigned identifiers spanning applicant
//!   records, identity records and reservations;
//! - an atomic "update if status is still pending" for applicant decisions.

pub mod applicant;
pub mod error;
pub mod identifier;
pub mod identity;

pub use applicant::{
    ApplicantProfile, ApplicantRecord, ApplicantStore, ApprovalCommit, ApprovalGrant,
    NewApplicant, RejectionGrant,
};
pub use error::{StoreError, UniqueField};
pub use identifier::IdentifierStore;
pub use identity::{IdentityRecord, IdentityStore, NewIdentity, RecoveryChallenge};

/// Everything the admission core needs from one backend.
pub trait AdmissionStore: ApplicantStore + IdentityStore + IdentifierStore + Send + Sync {}

impl<T> AdmissionStore for T where T: ApplicantStore + IdentityStore + IdentifierStore + Send + Sync {}
