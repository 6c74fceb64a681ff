//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption early, before the daemon begins
//! serving requests.

use std::path::Path;

use matric_store::{ApplicantRecord, IdentityRecord};

use crate::environment::{
    decode, decode_u64, LmdbEnvironment, APPLICANTS_DB, CONTACTS_DB, IDENTIFIERS_DB,
    IDENTITIES_DB, META_DB,
};
use crate::LmdbError;

/// Summary of an integrity check run.
#[derive(Debug, Default)]
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Database names that we expect to exist in a valid environment.
const EXPECTED_DATABASES: &[&str] = &[
    APPLICANTS_DB,
    IDENTITIES_DB,
    CONTACTS_DB,
    IDENTIFIERS_DB,
    META_DB,
];

/// Count every database and cross-check the indexes against the records.
///
/// Read failures and inconsistencies are collected in the report rather
/// than causing a hard error.
pub fn check_integrity(store: &LmdbEnvironment) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport::default();
    let rtxn = store.read_txn()?;

    for &db_name in EXPECTED_DATABASES {
        match store
            .env
            .open_database::<heed::types::Bytes, heed::types::Bytes>(&rtxn, Some(db_name))
        {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                match db.len(&rtxn) {
                    Ok(count) => report.total_entries += count,
                    Err(e) => report
                        .errors
                        .push(format!("failed to read database '{}': {}", db_name, e)),
                }
            }
            Ok(None) => report
                .errors
                .push(format!("database '{}' is missing", db_name)),
            Err(e) => report
                .errors
                .push(format!("failed to open database '{}': {}", db_name, e)),
        }
    }

    for entry in store.applicants_db.iter(&rtxn)? {
        let (_, val) = entry?;
        match decode::<ApplicantRecord>(val) {
            Ok(record) => {
                if !record.is_consistent() {
                    report
                        .errors
                        .push(format!("{} has inconsistent status fields", record.id));
                }
                if let Some(assigned) = &record.assigned_id {
                    if store
                        .identifiers_db
                        .get(&rtxn, assigned.as_str().as_bytes())?
                        .is_none()
                    {
                        report
                            .errors
                            .push(format!("{} holds unindexed {}", record.id, assigned));
                    }
                }
            }
            Err(e) => report.errors.push(format!("undecodable applicant: {e}")),
        }
    }

    for entry in store.identities_db.iter(&rtxn)? {
        let (_, val) = entry?;
        let record = match decode::<IdentityRecord>(val) {
            Ok(record) => record,
            Err(e) => {
                report.errors.push(format!("undecodable identity: {e}"));
                continue;
            }
        };
        let indexed = store
            .contacts_db
            .get(&rtxn, record.contact.as_str().as_bytes())?
            .map(decode_u64)
            .transpose()?;
        if indexed != Some(record.id.as_u64()) {
            report
                .errors
                .push(format!("{} is missing from the contact index", record.id));
        }
        if let Some(assigned) = &record.assigned_id {
            if store
                .identifiers_db
                .get(&rtxn, assigned.as_str().as_bytes())?
                .is_none()
            {
                report
                    .errors
                    .push(format!("{} holds unindexed {}", record.id, assigned));
            }
        }
    }

    Ok(report)
}

/// Check if the LMDB data directory looks valid before opening.
///
/// Returns `Ok(())` for a fresh (nonexistent) directory. Returns an error
/// if the directory exists but `data.mdb` is missing, which suggests
/// corruption or misconfiguration.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(());
    }
    let data_file = path.join("data.mdb");
    if !data_file.exists() {
        return Err(format!(
            "LMDB directory exists but data.mdb is missing at {}",
            path.display()
        ));
    }
    Ok(())
}
