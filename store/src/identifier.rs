//! The shared assigned-identifier space.

use crate::StoreError;
use matric_types::{AssignedId, Timestamp};

/// Trait for the identifier space shared by applicants and identities.
pub trait IdentifierStore {
    /// Every identifier currently held by an applicant record, an identity
    /// record or a reservation, including malformed legacy values.
    fn assigned_identifiers(&self) -> Result<Vec<AssignedId>, StoreError>;

    /// Claim `id` without attaching it to a record. Fails with
    /// [`StoreError::Duplicate`] if the value is already held anywhere.
    fn reserve_identifier(&self, id: &AssignedId, at: Timestamp) -> Result<(), StoreError>;
}
