//! Database schema migration engine.
//!
//! Tracks a monotonically increasing schema version in the meta database and
//! runs sequential migration functions to bring an older database up to date.

use crate::environment::LmdbEnvironment;
use crate::LmdbError;

/// The schema version that the current code expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

/// Runs database migrations to bring the schema up to date.
pub struct Migrator;

impl Migrator {
    /// Check the stored schema version and run any needed migrations.
    ///
    /// - Version 0 means a fresh database (no version stored yet).
    /// - A version above `CURRENT_SCHEMA_VERSION` was written by a newer
    ///   build and is refused.
    pub fn run(store: &LmdbEnvironment) -> Result<(), LmdbError> {
        let current = schema_version(store)?;

        if current == CURRENT_SCHEMA_VERSION {
            tracing::debug!(version = current, "database schema is up to date");
            return Ok(());
        }
        if current > CURRENT_SCHEMA_VERSION {
            return Err(LmdbError::SchemaTooNew {
                found: current,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }

        for version in current..CURRENT_SCHEMA_VERSION {
            tracing::info!(from = version, to = version + 1, "running migration");
            run_migration(version, version + 1)?;
        }

        let mut wtxn = store.write_txn()?;
        store
            .meta_db
            .put(&mut wtxn, SCHEMA_VERSION_KEY, &CURRENT_SCHEMA_VERSION.to_le_bytes())?;
        wtxn.commit()?;
        tracing::info!(version = CURRENT_SCHEMA_VERSION, "migration complete");
        Ok(())
    }
}

/// The schema version stored on disk, 0 for a fresh database.
pub fn schema_version(store: &LmdbEnvironment) -> Result<u32, LmdbError> {
    let rtxn = store.read_txn()?;
    match store.meta_db.get(&rtxn, SCHEMA_VERSION_KEY)? {
        Some(bytes) => {
            let arr: [u8; 4] = bytes.try_into().map_err(|_| {
                LmdbError::Corruption("schema_version has unexpected byte length".to_string())
            })?;
            Ok(u32::from_le_bytes(arr))
        }
        None => Ok(0),
    }
}

fn run_migration(from: u32, to: u32) -> Result<(), LmdbError> {
    match (from, to) {
        // Initial schema, nothing to carry over from a blank slate.
        (0, 1) => Ok(()),
        _ => Err(LmdbError::Heed(format!(
            "unknown migration: {} -> {}",
            from, to
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_migration_is_error() {
        assert!(run_migration(99, 100).is_err());
    }

    #[test]
    fn initial_migration_succeeds() {
        assert!(run_migration(0, 1).is_ok());
    }

    #[test]
    fn fresh_environment_is_stamped() {
        let dir = tempfile::tempdir().unwrap();
        let store = LmdbEnvironment::open(dir.path(), 10 * 1024 * 1024).unwrap();
        assert_eq!(schema_version(&store).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn newer_schema_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = LmdbEnvironment::open(dir.path(), 10 * 1024 * 1024).unwrap();
            let mut wtxn = store.write_txn().unwrap();
            store
                .meta_db
                .put(&mut wtxn, SCHEMA_VERSION_KEY, &99u32.to_le_bytes())
                .unwrap();
            wtxn.commit().unwrap();
            let err = Migrator::run(&store).unwrap_err();
            assert!(matches!(err, LmdbError::SchemaTooNew { found: 99, .. }));
        }
    }
}
