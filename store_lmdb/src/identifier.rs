//! LMDB implementation of IdentifierStore.
//!
//! The `identifiers` database is the uniqueness index for the shared
//! assigned-id space. Every writer that hands out an identifier checks and
//! fills it inside its own write transaction.

use heed::RwTxn;
use serde::{Deserialize, Serialize};

use matric_store::{IdentifierStore, StoreError, UniqueField};
use matric_types::{ApplicantId, AssignedId, IdentityId, Timestamp};

use crate::environment::{decode, encode, LmdbEnvironment};
use crate::LmdbError;

/// Who holds an assigned identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentifierOwner {
    /// An approved applicant and the member identity created with it.
    Applicant {
        applicant: ApplicantId,
        identity: IdentityId,
    },
    /// An identity created outside the admission flow.
    Identity(IdentityId),
    /// Allocated on its own, attached to no record.
    Reserved { at: Timestamp },
}

impl LmdbEnvironment {
    /// Fill the index entry for `id`, or fail with a uniqueness violation
    /// if something already holds it.
    pub(crate) fn claim_identifier(
        &self,
        wtxn: &mut RwTxn<'_>,
        id: &AssignedId,
        owner: &IdentifierOwner,
    ) -> Result<(), StoreError> {
        let key = id.as_str().as_bytes();
        if self
            .identifiers_db
            .get(wtxn, key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate {
                field: UniqueField::AssignedId,
                value: id.to_string(),
            });
        }
        let bytes = encode(owner)?;
        self.identifiers_db
            .put(wtxn, key, &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    /// The current holder of `id`, if any.
    pub fn identifier_owner(&self, id: &AssignedId) -> Result<Option<IdentifierOwner>, StoreError> {
        let rtxn = self.read_txn()?;
        let owner = self
            .identifiers_db
            .get(&rtxn, id.as_str().as_bytes())
            .map_err(LmdbError::from)?
            .map(decode::<IdentifierOwner>)
            .transpose()?;
        Ok(owner)
    }
}

impl IdentifierStore for LmdbEnvironment {
    fn assigned_identifiers(&self) -> Result<Vec<AssignedId>, StoreError> {
        let rtxn = self.read_txn()?;
        let mut held = Vec::new();
        for entry in self.identifiers_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (key, _) = entry.map_err(LmdbError::from)?;
            let raw = std::str::from_utf8(key)
                .map_err(|e| LmdbError::Corruption(format!("identifier key: {e}")))?;
            held.push(AssignedId::from_raw(raw));
        }
        Ok(held)
    }

    fn reserve_identifier(&self, id: &AssignedId, at: Timestamp) -> Result<(), StoreError> {
        let mut wtxn = self.write_txn()?;
        self.claim_identifier(&mut wtxn, id, &IdentifierOwner::Reserved { at })?;
        wtxn.commit().map_err(LmdbError::from)?;
        tracing::debug!(%id, "identifier reserved");
        Ok(())
    }
}
