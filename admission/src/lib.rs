//! Admission core.
//!
//! Three pieces of tightly coupled state:
//! 1. **Allocation**: a sequential, human-readable identifier unique across
//!    applicant and identity records, guarded by a uniqueness constraint
//!    plus bounded retry.
//! 2. **Admission**: a one-way `pending → approved | rejected` state machine
//!    whose approval creates the member account.
//! 3. **Recovery**: a short-lived one-time-code challenge that ends in a
//!    single-use reset token.
//!
//! Notification delivery and document storage are collaborators behind the
//! [`Notifier`] and [`DocumentStore`] traits; their failures are logged and
//! never undo a committed transition.

pub mod allocator;
pub mod credentials;
pub mod documents;
pub mod effects;
pub mod error;
pub mod machine;
pub mod notifier;
pub mod recovery;
pub mod service;

pub use allocator::IdentifierAllocator;
pub use credentials::{CredentialIssuer, Provisioned};
pub use documents::{DocumentError, DocumentStore};
pub use effects::{Effect, EffectFailure, EffectReport, EffectRunner};
pub use error::AdmissionError;
pub use machine::{AdmissionMachine, Approval, Rejection};
pub use notifier::{Notifier, NotifyError};
pub use recovery::RecoveryFlow;
pub use service::AdmissionCore;
