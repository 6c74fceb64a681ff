//! Best-effort effects that follow a committed transition.
//!
//! A transition is one mandatory store write followed by an ordered list of
//! effects. Each effect runs independently: a failure is logged and
//! recorded in the [`EffectReport`], and the next effect still runs.
//! Nothing here is retried or rolled back.

use std::sync::Arc;

use matric_crypto::Secret;
use matric_types::{AssignedId, ContactAddress, Role};
use tracing::warn;

use crate::{DocumentStore, Notifier};

/// One best-effort action.
#[derive(Debug)]
pub enum Effect {
    NotifyAcceptance {
        contact: ContactAddress,
        assigned_id: AssignedId,
        secret: Secret,
    },
    NotifyRejection {
        contact: ContactAddress,
        reason: String,
    },
    NotifyCredentials {
        contact: ContactAddress,
        assigned_id: Option<AssignedId>,
        secret: Secret,
    },
    NotifyRecoveryCode {
        contact: ContactAddress,
        role: Role,
        code: Secret,
    },
    DeleteDocument {
        reference: String,
    },
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotifyAcceptance { .. } => "notify_acceptance",
            Self::NotifyRejection { .. } => "notify_rejection",
            Self::NotifyCredentials { .. } => "notify_credentials",
            Self::NotifyRecoveryCode { .. } => "notify_recovery_code",
            Self::DeleteDocument { .. } => "delete_document",
        }
    }

    /// What the effect acts on, safe to log.
    fn target(&self) -> String {
        match self {
            Self::NotifyAcceptance { contact, .. }
            | Self::NotifyRejection { contact, .. }
            | Self::NotifyCredentials { contact, .. }
            | Self::NotifyRecoveryCode { contact, .. } => contact.to_string(),
            Self::DeleteDocument { reference } => reference.clone(),
        }
    }
}

/// A logged effect failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EffectFailure {
    pub effect: &'static str,
    pub target: String,
    pub error: String,
}

/// Outcome of running an effect list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EffectReport {
    pub completed: Vec<&'static str>,
    pub failures: Vec<EffectFailure>,
}

impl EffectReport {
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs effects against the notifier and document store collaborators.
#[derive(Clone)]
pub struct EffectRunner {
    notifier: Arc<dyn Notifier>,
    documents: Arc<dyn DocumentStore>,
}

impl EffectRunner {
    pub fn new(notifier: Arc<dyn Notifier>, documents: Arc<dyn DocumentStore>) -> Self {
        Self {
            notifier,
            documents,
        }
    }

    /// Run every effect in order, logging and recording failures.
    pub fn run(&self, effects: Vec<Effect>) -> EffectReport {
        let mut report = EffectReport::default();
        for effect in effects {
            let name = effect.name();
            match self.apply(&effect) {
                Ok(()) => report.completed.push(name),
                Err(error) => {
                    let target = effect.target();
                    warn!(effect = name, %target, %error, "best-effort effect failed");
                    report.failures.push(EffectFailure {
                        effect: name,
                        target,
                        error,
                    });
                }
            }
        }
        report
    }

    fn apply(&self, effect: &Effect) -> Result<(), String> {
        let result = match effect {
            Effect::NotifyAcceptance {
                contact,
                assigned_id,
                secret,
            } => self.notifier.send_acceptance(contact, assigned_id, secret),
            Effect::NotifyRejection { contact, reason } => {
                self.notifier.send_rejection(contact, reason)
            }
            Effect::NotifyCredentials {
                contact,
                assigned_id,
                secret,
            } => self
                .notifier
                .send_credentials(contact, assigned_id.as_ref(), secret),
            Effect::NotifyRecoveryCode {
                contact,
                role,
                code,
            } => self.notifier.send_recovery_code(contact, *role, code),
            Effect::DeleteDocument { reference } => {
                return self.documents.delete(reference).map_err(|e| e.to_string())
            }
        };
        result.map_err(|e| e.to_string())
    }
}
