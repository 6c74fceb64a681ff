//! Argon2id hashing of account secrets.
//!
//! Hashes are stored as PHC strings, so each one carries its own salt and
//! cost parameters and stays verifiable after the configured cost changes.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::CryptoError;

/// Lanes of parallelism for every hash.
const ARGON2_PARALLELISM: u32 = 1;

/// Hashes and verifies account secrets with Argon2id.
#[derive(Clone, Debug)]
pub struct SecretHasher {
    params: Params,
}

impl SecretHasher {
    pub fn new(memory_kib: u32, iterations: u32) -> Result<Self, CryptoError> {
        let params = Params::new(memory_kib, iterations, ARGON2_PARALLELISM, None)
            .map_err(|e| CryptoError::Params(e.to_string()))?;
        Ok(Self { params })
    }

    /// Hash a plaintext secret with a fresh random salt.
    pub fn hash(&self, secret: &str) -> Result<String, CryptoError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| CryptoError::Hash(e.to_string()))
    }

    /// Check a plaintext secret against a stored PHC string.
    ///
    /// Malformed stored hashes never verify.
    pub fn verify(&self, secret: &str, stored: &str) -> bool {
        match PasswordHash::new(stored) {
            Ok(parsed) => Argon2::default()
                .verify_password(secret.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> SecretHasher {
        SecretHasher::new(8, 1).unwrap()
    }

    #[test]
    fn hash_then_verify() {
        let hasher = cheap();
        let stored = hasher.hash("NewPass1").unwrap();
        assert!(stored.starts_with("$argon2id$"));
        assert!(hasher.verify("NewPass1", &stored));
        assert!(!hasher.verify("NewPass2", &stored));
    }

    #[test]
    fn salts_differ() {
        let hasher = cheap();
        assert_ne!(hasher.hash("same").unwrap(), hasher.hash("same").unwrap());
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!cheap().verify("anything", "not-a-phc-string"));
        assert!(!cheap().verify("", ""));
    }

    #[test]
    fn hash_from_other_cost_still_verifies() {
        let stored = SecretHasher::new(16, 2).unwrap().hash("Portable9").unwrap();
        assert!(cheap().verify("Portable9", &stored));
    }

    #[test]
    fn rejects_zero_iterations() {
        assert!(SecretHasher::new(8, 0).is_err());
    }
}
