//! LMDB environment setup.
//!
//! One environment holds every database, so a single write transaction can
//! touch applicants, identities and both indexes at once.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions, RoTxn, RwTxn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::migration::Migrator;
use crate::LmdbError;

pub(crate) const APPLICANTS_DB: &str = "applicants";
pub(crate) const IDENTITIES_DB: &str = "identities";
pub(crate) const CONTACTS_DB: &str = "contacts";
pub(crate) const IDENTIFIERS_DB: &str = "identifiers";
pub(crate) const META_DB: &str = "meta";

const MAX_DBS: u32 = 8;

/// Wraps the LMDB environment and all database handles.
///
/// Layout:
/// - `applicants`: `ApplicantId` (big-endian) → bincode `ApplicantRecord`
/// - `identities`: `IdentityId` (big-endian) → bincode `IdentityRecord`
/// - `contacts`: contact address → `IdentityId` (big-endian)
/// - `identifiers`: assigned id → bincode `IdentifierOwner`
/// - `meta`: schema version and id counters
#[derive(Clone)]
pub struct LmdbEnvironment {
    pub(crate) env: Arc<Env>,
    pub(crate) applicants_db: Database<Bytes, Bytes>,
    pub(crate) identities_db: Database<Bytes, Bytes>,
    pub(crate) contacts_db: Database<Bytes, Bytes>,
    pub(crate) identifiers_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path and bring its
    /// schema up to date.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        fs::create_dir_all(path)?;
        // SAFETY: the environment is opened once per process and the daemon
        // never maps the same directory twice.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let applicants_db = env.create_database(&mut wtxn, Some(APPLICANTS_DB))?;
        let identities_db = env.create_database(&mut wtxn, Some(IDENTITIES_DB))?;
        let contacts_db = env.create_database(&mut wtxn, Some(CONTACTS_DB))?;
        let identifiers_db = env.create_database(&mut wtxn, Some(IDENTIFIERS_DB))?;
        let meta_db = env.create_database(&mut wtxn, Some(META_DB))?;
        wtxn.commit()?;

        let store = Self {
            env: Arc::new(env),
            applicants_db,
            identities_db,
            contacts_db,
            identifiers_db,
            meta_db,
        };
        Migrator::run(&store)?;
        info!(path = %path.display(), map_size, "LMDB environment opened");
        Ok(store)
    }

    pub(crate) fn read_txn(&self) -> Result<RoTxn<'_>, LmdbError> {
        Ok(self.env.read_txn()?)
    }

    pub(crate) fn write_txn(&self) -> Result<RwTxn<'_>, LmdbError> {
        Ok(self.env.write_txn()?)
    }

    /// Bump a big-endian `u64` counter in `meta` and return the new value.
    pub(crate) fn next_counter(&self, wtxn: &mut RwTxn<'_>, key: &[u8]) -> Result<u64, LmdbError> {
        let current = match self.meta_db.get(wtxn, key)? {
            Some(bytes) => decode_u64(bytes)?,
            None => 0,
        };
        let next = current + 1;
        self.meta_db.put(wtxn, key, &next.to_be_bytes())?;
        Ok(next)
    }
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, LmdbError> {
    Ok(bincode::serialize(value)?)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, LmdbError> {
    Ok(bincode::deserialize(bytes)?)
}

pub(crate) fn decode_u64(bytes: &[u8]) -> Result<u64, LmdbError> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| LmdbError::Corruption(format!("expected 8 bytes, found {}", bytes.len())))?;
    Ok(u64::from_be_bytes(arr))
}
