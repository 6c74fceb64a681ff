//! LMDB implementation of ApplicantStore.

use heed::RoTxn;

use matric_store::{
    ApplicantRecord, ApplicantStore, ApprovalCommit, ApprovalGrant, IdentityRecord,
    NewApplicant, RejectionGrant, StoreError,
};
use matric_types::{ApplicantId, ApplicantStatus, IdentityId};

use crate::environment::{decode, encode, LmdbEnvironment};
use crate::identifier::IdentifierOwner;
use crate::LmdbError;

const LAST_APPLICANT_KEY: &[u8] = b"last_applicant";
pub(crate) const LAST_IDENTITY_KEY: &[u8] = b"last_identity";

impl LmdbEnvironment {
    fn load_applicant(&self, txn: &RoTxn<'_>, id: ApplicantId) -> Result<ApplicantRecord, LmdbError> {
        let bytes = self
            .applicants_db
            .get(txn, id.to_key().as_slice())?
            .ok_or_else(|| LmdbError::NotFound(id.to_string()))?;
        decode(bytes)
    }

    fn load_pending(&self, txn: &RoTxn<'_>, id: ApplicantId) -> Result<ApplicantRecord, StoreError> {
        let record = self.load_applicant(txn, id)?;
        if record.status != ApplicantStatus::Pending {
            return Err(record.status_conflict());
        }
        Ok(record)
    }
}

impl ApplicantStore for LmdbEnvironment {
    fn insert_applicant(&self, new: NewApplicant) -> Result<ApplicantRecord, StoreError> {
        let mut wtxn = self.write_txn()?;
        let id = ApplicantId::new(self.next_counter(&mut wtxn, LAST_APPLICANT_KEY)?);
        let record = ApplicantRecord::from_new(id, new);
        let bytes = encode(&record)?;
        self.applicants_db
            .put(&mut wtxn, id.to_key().as_slice(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(record)
    }

    fn get_applicant(&self, id: ApplicantId) -> Result<ApplicantRecord, StoreError> {
        let rtxn = self.read_txn()?;
        Ok(self.load_applicant(&rtxn, id)?)
    }

    fn iter_applicants(&self) -> Result<Vec<ApplicantRecord>, StoreError> {
        let rtxn = self.read_txn()?;
        let mut records = Vec::new();
        for entry in self.applicants_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_, val) = entry.map_err(LmdbError::from)?;
            records.push(decode(val)?);
        }
        Ok(records)
    }

    fn applicant_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.read_txn()?;
        Ok(self.applicants_db.len(&rtxn).map_err(LmdbError::from)?)
    }

    fn approve_applicant(
        &self,
        id: ApplicantId,
        grant: &ApprovalGrant,
    ) -> Result<ApprovalCommit, StoreError> {
        // Dropping `wtxn` on any early return aborts every write below.
        let mut wtxn = self.write_txn()?;
        let mut applicant = self.load_pending(&wtxn, id)?;
        self.check_contact_free(&wtxn, &grant.identity.contact)?;

        let identity_id = IdentityId::new(self.next_counter(&mut wtxn, LAST_IDENTITY_KEY)?);
        self.claim_identifier(
            &mut wtxn,
            &grant.assigned_id,
            &IdentifierOwner::Applicant {
                applicant: id,
                identity: identity_id,
            },
        )?;
        let identity = IdentityRecord::from_new(identity_id, grant.identity.clone());
        self.write_identity(&mut wtxn, &identity)?;
        self.contacts_db
            .put(
                &mut wtxn,
                identity.contact.as_str().as_bytes(),
                identity_id.to_key().as_slice(),
            )
            .map_err(LmdbError::from)?;

        applicant.apply_approval(grant);
        let bytes = encode(&applicant)?;
        self.applicants_db
            .put(&mut wtxn, id.to_key().as_slice(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;

        Ok(ApprovalCommit {
            applicant,
            identity,
        })
    }

    fn reject_applicant(
        &self,
        id: ApplicantId,
        grant: &RejectionGrant,
    ) -> Result<ApplicantRecord, StoreError> {
        let mut wtxn = self.write_txn()?;
        let mut applicant = self.load_pending(&wtxn, id)?;
        applicant.apply_rejection(grant);
        let bytes = encode(&applicant)?;
        self.applicants_db
            .put(&mut wtxn, id.to_key().as_slice(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(applicant)
    }
}
