//! Contact address of an applicant or account holder.

use crate::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A normalised e-mail address: trimmed and lower-cased.
///
/// Identity lookups are keyed on this value, so two spellings of the same
/// address always collide on the uniqueness constraint.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContactAddress(String);

impl ContactAddress {
    /// Parse and normalise an address.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let normalised = raw.trim().to_lowercase();
        let valid = match normalised.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@')
                    && !normalised.chars().any(char::is_whitespace)
            }
            None => false,
        };
        if valid {
            Ok(Self(normalised))
        } else {
            Err(TypesError::InvalidContact(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContactAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContactAddress {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
