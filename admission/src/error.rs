use matric_crypto::{CryptoError, WeakSecret};
use matric_store::{StoreError, UniqueField};
use matric_types::{ApplicantStatus, TypesError};
use thiserror::Error;

/// Every terminal result the admission core can surface.
///
/// Raw storage errors never escape: they are folded into the kinds below
/// by the `From<StoreError>` conversion.
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// Transition attempted on a record that is no longer pending.
    #[error("{applicant} was already processed (status: {status})")]
    AlreadyProcessed {
        applicant: String,
        status: ApplicantStatus,
    },

    /// Every allocation attempt lost to a concurrent writer.
    #[error("identifier allocation exhausted after {attempts} attempts")]
    AllocationExhausted { attempts: u32 },

    #[error("account is disabled")]
    AccountDisabled,

    #[error("no active recovery challenge")]
    NoActiveChallenge,

    #[error("recovery code has expired")]
    ChallengeExpired,

    #[error("recovery code does not match")]
    InvalidCode,

    #[error("too many wrong recovery codes; request a new code")]
    AttemptsExhausted,

    #[error("reset token is invalid or expired")]
    InvalidOrExpiredToken,

    #[error("weak secret: {0}")]
    WeakSecret(#[from] WeakSecret),

    #[error("rejection reason must not be empty")]
    EmptyReason,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("contact {0} already belongs to an account")]
    ContactInUse(String),

    #[error("{0} not found")]
    NotFound(String),

    /// Persistence or network hiccup; the whole call is safe to retry.
    #[error("transient failure, retry the operation: {0}")]
    TransientError(String),

    /// Non-recoverable storage failure (corruption, undecodable record).
    #[error("storage failure: {0}")]
    Storage(String),

    #[error("credential error: {0}")]
    Credential(#[from] CryptoError),

    #[error(transparent)]
    InvalidParams(#[from] TypesError),
}

impl AdmissionError {
    /// Whether the caller may simply retry the whole operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientError(_))
    }
}

impl From<StoreError> for AdmissionError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(key) => Self::NotFound(key),
            StoreError::StatusConflict { key, found } => Self::AlreadyProcessed {
                applicant: key,
                status: found,
            },
            StoreError::Duplicate {
                field: UniqueField::Contact,
                value,
            } => Self::ContactInUse(value),
            StoreError::Duplicate {
                field: UniqueField::AssignedId,
                value,
            } => Self::TransientError(format!("identifier {value} was taken concurrently")),
            e @ (StoreError::Stale(_) | StoreError::Unavailable(_) | StoreError::Backend(_)) => {
                Self::TransientError(e.to_string())
            }
            e @ (StoreError::Serialization(_) | StoreError::Corruption(_)) => {
                Self::Storage(e.to_string())
            }
        }
    }
}
