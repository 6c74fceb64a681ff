//! LMDB storage backend for the matric admission core.
//!
//! Implements every storage trait from `matric-store` on a single
//! [`LmdbEnvironment`] using the `heed` LMDB bindings. Each trait method
//! that writes runs in one LMDB write transaction, which LMDB serializes
//! across threads, so conditional updates and uniqueness checks never
//! interleave.

pub mod applicant;
pub mod environment;
pub mod error;
pub mod identifier;
pub mod identity;
pub mod integrity;
pub mod migration;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use identifier::IdentifierOwner;
pub use integrity::{check_data_dir, check_integrity, IntegrityReport};
