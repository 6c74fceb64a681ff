//! Admission parameters: every tunable constant of the admission core.
//!
//! Loaded from the `[params]` table of the daemon configuration; any field
//! missing from the file falls back to [`AdmissionParams::standard_defaults`].

use serde::{Deserialize, Serialize};

use crate::TypesError;

/// Longest one-time code that still fits the code generator's range.
pub const MAX_CODE_DIGITS: u32 = 9;

/// All tunable values of the admission core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionParams {
    // ── Identifier allocation ────────────────────────────────────────────
    /// Literal prefix of every assigned identifier.
    pub id_prefix: String,

    /// Minimum number of zero-padded digits after the prefix.
    pub id_width: usize,

    /// Attempts before allocation gives up with `AllocationExhausted`.
    pub allocation_max_attempts: u32,

    /// Fixed pause between allocation attempts, in milliseconds.
    pub allocation_retry_delay_ms: u64,

    // ── Credentials ──────────────────────────────────────────────────────
    /// Length of generated temporary secrets.
    pub temporary_secret_len: usize,

    /// Minimum length a chosen secret must reach.
    pub min_secret_len: usize,

    /// Argon2id memory cost in KiB.
    pub hash_memory_kib: u32,

    /// Argon2id iteration count.
    pub hash_iterations: u32,

    // ── Recovery ─────────────────────────────────────────────────────────
    /// Number of digits in a one-time code.
    pub code_digits: u32,

    /// Lifetime of a one-time code in seconds.
    pub code_ttl_secs: u64,

    /// Lifetime of a reset token in seconds.
    pub reset_token_ttl_secs: u64,

    /// Wrong codes tolerated per challenge before it is discarded.
    pub max_code_attempts: u32,
}

impl AdmissionParams {
    /// Production configuration.
    pub fn standard_defaults() -> Self {
        Self {
            id_prefix: "STU".to_string(),
            id_width: crate::id::DEFAULT_ID_WIDTH,
            allocation_max_attempts: 5,
            allocation_retry_delay_ms: 100,

            temporary_secret_len: 10,
            min_secret_len: 8,
            hash_memory_kib: 19 * 1024, // argon2 crate default
            hash_iterations: 2,

            code_digits: 6,
            code_ttl_secs: 5 * 60,
            reset_token_ttl_secs: 15 * 60,
            max_code_attempts: 5,
        }
    }

    /// Same semantics with no retry pause and the cheapest hashing cost,
    /// for test suites that create many accounts.
    pub fn fast_test_defaults() -> Self {
        Self {
            allocation_retry_delay_ms: 0,
            hash_memory_kib: 8,
            hash_iterations: 1,
            ..Self::standard_defaults()
        }
    }

    /// Reject values the core cannot honour as configured.
    pub fn validate(&self) -> Result<(), TypesError> {
        if self.id_prefix.is_empty() {
            return Err(invalid("id_prefix must not be empty"));
        }
        if !(1..=MAX_CODE_DIGITS).contains(&self.code_digits) {
            return Err(invalid(format!(
                "code_digits must be between 1 and {MAX_CODE_DIGITS}, got {}",
                self.code_digits
            )));
        }
        if self.max_code_attempts == 0 {
            return Err(invalid("max_code_attempts must be greater than 0"));
        }
        if self.code_ttl_secs == 0 || self.reset_token_ttl_secs == 0 {
            return Err(invalid("code and reset token lifetimes must be greater than 0"));
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> TypesError {
    TypesError::InvalidParams {
        reason: reason.into(),
    }
}

impl Default for AdmissionParams {
    fn default() -> Self {
        Self::standard_defaults()
    }
}
