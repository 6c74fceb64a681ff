//! Plaintext secrets and the temporary secret generator.

use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;
use zeroize::Zeroizing;

const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!@#$%^&*";

/// Shortest secret that can hold one character of every class.
pub const MIN_TEMPORARY_SECRET_LEN: usize = 4;

/// A plaintext secret (temporary password, one-time code, reset token).
///
/// Wiped from memory on drop; `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Zeroizing<String>);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// Borrow the plaintext. Callers must not log it.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

fn pick<R: Rng + ?Sized>(rng: &mut R, class: &[u8]) -> u8 {
    class[rng.gen_range(0..class.len())]
}

/// Generate a temporary secret of `len` characters (at least
/// [`MIN_TEMPORARY_SECRET_LEN`]).
///
/// Contains at least one upper-case letter, lower-case letter, digit and
/// symbol; the rest is drawn uniformly from the combined alphabet and the
/// whole string is shuffled so the guaranteed characters have no fixed slot.
pub fn generate_temporary_secret<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Secret {
    let len = len.max(MIN_TEMPORARY_SECRET_LEN);
    let alphabet: Vec<u8> = [UPPER, LOWER, DIGITS, SYMBOLS].concat();

    let mut chars = Zeroizing::new(Vec::with_capacity(len));
    for class in [UPPER, LOWER, DIGITS, SYMBOLS] {
        chars.push(pick(rng, class));
    }
    while chars.len() < len {
        chars.push(pick(rng, &alphabet));
    }
    chars.shuffle(rng);

    let value: String = chars.iter().map(|&b| b as char).collect();
    Secret::new(value)
}
