//! Outbound notification collaborator.
//!
//! The core decides what is sent and when; templating and transport belong
//! to the implementation. Every call is best-effort from the core's side.

use matric_crypto::Secret;
use matric_types::{AssignedId, ContactAddress, Role};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("delivery to {contact} failed: {reason}")]
    Delivery { contact: String, reason: String },

    #[error("notifier unavailable: {0}")]
    Unavailable(String),
}

/// Delivers e-mails on behalf of the admission core.
pub trait Notifier: Send + Sync {
    /// Welcome an admitted applicant with their identifier and temporary secret.
    fn send_acceptance(
        &self,
        contact: &ContactAddress,
        assigned_id: &AssignedId,
        secret: &Secret,
    ) -> Result<(), NotifyError>;

    /// Tell an applicant their application was turned down.
    fn send_rejection(&self, contact: &ContactAddress, reason: &str) -> Result<(), NotifyError>;

    /// Send login credentials for a provisioned or re-issued account.
    fn send_credentials(
        &self,
        contact: &ContactAddress,
        assigned_id: Option<&AssignedId>,
        secret: &Secret,
    ) -> Result<(), NotifyError>;

    /// Send a one-time recovery code.
    fn send_recovery_code(
        &self,
        contact: &ContactAddress,
        role: Role,
        code: &Secret,
    ) -> Result<(), NotifyError>;
}
