//! LMDB implementation of IdentityStore.
//!
//! Contacts are unique through the `contacts` index; updates are guarded by
//! the record's revision counter.

use heed::{RoTxn, RwTxn};

use matric_store::{
    IdentityRecord, IdentityStore, NewIdentity, RecoveryChallenge, StoreError, UniqueField,
};
use matric_types::{ContactAddress, IdentityId, Timestamp};

use crate::applicant::LAST_IDENTITY_KEY;
use crate::environment::{decode, decode_u64, encode, LmdbEnvironment};
use crate::identifier::IdentifierOwner;
use crate::LmdbError;

impl LmdbEnvironment {
    pub(crate) fn check_contact_free(
        &self,
        txn: &RoTxn<'_>,
        contact: &ContactAddress,
    ) -> Result<(), StoreError> {
        let taken = self
            .contacts_db
            .get(txn, contact.as_str().as_bytes())
            .map_err(LmdbError::from)?
            .is_some();
        if taken {
            return Err(StoreError::Duplicate {
                field: UniqueField::Contact,
                value: contact.to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn write_identity(
        &self,
        wtxn: &mut RwTxn<'_>,
        record: &IdentityRecord,
    ) -> Result<(), LmdbError> {
        let bytes = encode(record)?;
        self.identities_db
            .put(wtxn, record.id.to_key().as_slice(), &bytes)?;
        Ok(())
    }

    fn load_identity(&self, txn: &RoTxn<'_>, id: IdentityId) -> Result<IdentityRecord, LmdbError> {
        let bytes = self
            .identities_db
            .get(txn, id.to_key().as_slice())?
            .ok_or_else(|| LmdbError::NotFound(id.to_string()))?;
        decode(bytes)
    }
}

impl IdentityStore for LmdbEnvironment {
    fn insert_identity(&self, new: NewIdentity) -> Result<IdentityRecord, StoreError> {
        let mut wtxn = self.write_txn()?;
        self.check_contact_free(&wtxn, &new.contact)?;
        let id = IdentityId::new(self.next_counter(&mut wtxn, LAST_IDENTITY_KEY)?);
        if let Some(assigned) = &new.assigned_id {
            self.claim_identifier(&mut wtxn, assigned, &IdentifierOwner::Identity(id))?;
        }

        let record = IdentityRecord::from_new(id, new);
        self.write_identity(&mut wtxn, &record)?;
        self.contacts_db
            .put(
                &mut wtxn,
                record.contact.as_str().as_bytes(),
                id.to_key().as_slice(),
            )
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(record)
    }

    fn get_identity(&self, id: IdentityId) -> Result<IdentityRecord, StoreError> {
        let rtxn = self.read_txn()?;
        Ok(self.load_identity(&rtxn, id)?)
    }

    fn find_identity(&self, contact: &ContactAddress) -> Result<Option<IdentityRecord>, StoreError> {
        let rtxn = self.read_txn()?;
        let Some(key) = self
            .contacts_db
            .get(&rtxn, contact.as_str().as_bytes())
            .map_err(LmdbError::from)?
        else {
            return Ok(None);
        };
        let id = IdentityId::new(decode_u64(key)?);
        let record = self.load_identity(&rtxn, id).map_err(|e| match e {
            LmdbError::NotFound(_) => {
                LmdbError::Corruption(format!("contact index points at missing {id}"))
            }
            other => other,
        })?;
        Ok(Some(record))
    }

    fn iter_identities(&self) -> Result<Vec<IdentityRecord>, StoreError> {
        let rtxn = self.read_txn()?;
        let mut records = Vec::new();
        for entry in self.identities_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_, val) = entry.map_err(LmdbError::from)?;
            records.push(decode(val)?);
        }
        Ok(records)
    }

    fn identity_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.read_txn()?;
        Ok(self.identities_db.len(&rtxn).map_err(LmdbError::from)?)
    }

    fn update_identity(&self, record: &IdentityRecord) -> Result<IdentityRecord, StoreError> {
        let mut wtxn = self.write_txn()?;
        let mut stored = self.load_identity(&wtxn, record.id)?;
        if stored.revision != record.revision {
            return Err(StoreError::Stale(record.id.to_string()));
        }
        stored.merge_update(record);
        self.write_identity(&mut wtxn, &stored)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(stored)
    }

    fn put_recovery(
        &self,
        id: IdentityId,
        challenge: &RecoveryChallenge,
    ) -> Result<IdentityRecord, StoreError> {
        let mut wtxn = self.write_txn()?;
        let mut stored = self.load_identity(&wtxn, id)?;
        stored.recovery = challenge.clone();
        stored.revision += 1;
        self.write_identity(&mut wtxn, &stored)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(stored)
    }

    fn record_access(&self, id: IdentityId, at: Timestamp) -> Result<IdentityRecord, StoreError> {
        let mut wtxn = self.write_txn()?;
        let mut stored = self.load_identity(&wtxn, id)?;
        stored.last_access_at = stored.last_access_at.max(Some(at));
        self.write_identity(&mut wtxn, &stored)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(stored)
    }
}
