//! Record ids and the human-readable assigned identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned key of an applicant record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicantId(u64);

impl ApplicantId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Big-endian key bytes, so byte order matches numeric order.
    pub fn to_key(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for ApplicantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "applicant#{}", self.0)
    }
}

/// Store-assigned key of an identity record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IdentityId(u64);

impl IdentityId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn to_key(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "identity#{}", self.0)
    }
}

/// Minimum number of digits in a formatted identifier.
pub const DEFAULT_ID_WIDTH: usize = 4;

/// A human-readable identifier such as `STU0007`.
///
/// Holds the raw persisted string: values written by older systems may not
/// follow `PREFIX + digits`, and must still round-trip untouched.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssignedId(String);

impl AssignedId {
    /// Format `number` as `prefix` followed by at least `width` zero-padded digits.
    pub fn format(prefix: &str, number: u64, width: usize) -> Self {
        Self(format!("{prefix}{number:0width$}"))
    }

    /// Wrap an already-persisted value without validation.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The numeric part, if this value is exactly `prefix` followed by one or more digits.
    pub fn number(&self, prefix: &str) -> Option<u64> {
        let digits = self.0.strip_prefix(prefix)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

impl fmt::Display for AssignedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
