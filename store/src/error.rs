use matric_types::ApplicantStatus;
use std::fmt;
use thiserror::Error;

/// Fields covered by a uniqueness constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniqueField {
    /// Shared across applicant records, identity records and reservations.
    AssignedId,
    /// Identity contact address.
    Contact,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AssignedId => f.write_str("assigned id"),
            Self::Contact => f.write_str("contact"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("duplicate {field}: {value}")]
    Duplicate { field: UniqueField, value: String },

    #[error("{key} is {found}, expected pending")]
    StatusConflict { key: String, found: ApplicantStatus },

    #[error("stale write to {0}: record changed since it was read")]
    Stale(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database is corrupted: {0}")]
    Corruption(String),
}

impl StoreError {
    /// Whether this is the identifier uniqueness constraint firing.
    pub fn is_identifier_conflict(&self) -> bool {
        matches!(
            self,
            Self::Duplicate {
                field: UniqueField::AssignedId,
                ..
            }
        )
    }
}
