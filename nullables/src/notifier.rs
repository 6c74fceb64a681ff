//! Nullable notifier: records deliveries instead of sending them.

use matric_admission::{Notifier, NotifyError};
use matric_crypto::Secret;
use matric_types::{AssignedId, ContactAddress, Role};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// One recorded delivery, plaintext included so tests can act on it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delivery {
    Acceptance {
        contact: ContactAddress,
        assigned_id: AssignedId,
        secret: String,
    },
    Rejection {
        contact: ContactAddress,
        reason: String,
    },
    Credentials {
        contact: ContactAddress,
        assigned_id: Option<AssignedId>,
        secret: String,
    },
    RecoveryCode {
        contact: ContactAddress,
        role: Role,
        code: String,
    },
}

pub struct NullNotifier {
    sent: Mutex<Vec<Delivery>>,
    failing: AtomicBool,
}

impl NullNotifier {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// A notifier whose every delivery fails.
    pub fn failing() -> Self {
        let notifier = Self::new();
        notifier.set_failing(true);
        notifier
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every successful delivery, in order.
    pub fn sent(&self) -> Vec<Delivery> {
        self.sent.lock().unwrap().clone()
    }

    /// The most recent recovery code sent to `contact`.
    pub fn last_recovery_code(&self, contact: &ContactAddress) -> Option<String> {
        self.sent.lock().unwrap().iter().rev().find_map(|d| match d {
            Delivery::RecoveryCode { contact: to, code, .. } if to == contact => {
                Some(code.clone())
            }
            _ => None,
        })
    }

    /// The most recent temporary secret (acceptance or credentials) sent to `contact`.
    pub fn last_secret(&self, contact: &ContactAddress) -> Option<String> {
        self.sent.lock().unwrap().iter().rev().find_map(|d| match d {
            Delivery::Acceptance {
                contact: to, secret, ..
            }
            | Delivery::Credentials {
                contact: to, secret, ..
            } if to == contact => Some(secret.clone()),
            _ => None,
        })
    }

    pub fn reset(&self) {
        self.sent.lock().unwrap().clear();
    }

    fn record(&self, contact: &ContactAddress, delivery: Delivery) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Delivery {
                contact: contact.to_string(),
                reason: "null notifier set to fail".to_string(),
            });
        }
        self.sent.lock().unwrap().push(delivery);
        Ok(())
    }
}

impl Default for NullNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for NullNotifier {
    fn send_acceptance(
        &self,
        contact: &ContactAddress,
        assigned_id: &AssignedId,
        secret: &Secret,
    ) -> Result<(), NotifyError> {
        self.record(
            contact,
            Delivery::Acceptance {
                contact: contact.clone(),
                assigned_id: assigned_id.clone(),
                secret: secret.expose().to_string(),
            },
        )
    }

    fn send_rejection(&self, contact: &ContactAddress, reason: &str) -> Result<(), NotifyError> {
        self.record(
            contact,
            Delivery::Rejection {
                contact: contact.clone(),
                reason: reason.to_string(),
            },
        )
    }

    fn send_credentials(
        &self,
        contact: &ContactAddress,
        assigned_id: Option<&AssignedId>,
        secret: &Secret,
    ) -> Result<(), NotifyError> {
        self.record(
            contact,
            Delivery::Credentials {
                contact: contact.clone(),
                assigned_id: assigned_id.cloned(),
                secret: secret.expose().to_string(),
            },
        )
    }

    fn send_recovery_code(
        &self,
        contact: &ContactAddress,
        role: Role,
        code: &Secret,
    ) -> Result<(), NotifyError> {
        self.record(
            contact,
            Delivery::RecoveryCode {
                contact: contact.clone(),
                role,
                code: code.expose().to_string(),
            },
        )
    }
}
