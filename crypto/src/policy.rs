//! Minimum-strength check for secrets chosen by account holders.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WeakSecret {
    #[error("secret must be at least {min} characters long")]
    TooShort { min: usize },

    #[error("secret must contain an upper-case letter")]
    MissingUppercase,

    #[error("secret must contain a lower-case letter")]
    MissingLowercase,

    #[error("secret must contain a digit")]
    MissingDigit,
}

/// Require `min_len` characters with at least one upper-case letter,
/// lower-case letter and digit.
pub fn check_strength(secret: &str, min_len: usize) -> Result<(), WeakSecret> {
    if secret.chars().count() < min_len {
        return Err(WeakSecret::TooShort { min: min_len });
    }
    if !secret.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(WeakSecret::MissingUppercase);
    }
    if !secret.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(WeakSecret::MissingLowercase);
    }
    if !secret.chars().any(|c| c.is_ascii_digit()) {
        return Err(WeakSecret::MissingDigit);
    }
    Ok(())
}
