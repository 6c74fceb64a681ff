//! Blake2b digests for one-time codes and reset tokens at rest.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

type Blake2b256 = Blake2b<U32>;

/// Compute a 256-bit Blake2b hash of arbitrary data.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Hex-encoded Blake2b-256 digest of a plaintext value.
pub fn digest_hex(plaintext: &str) -> String {
    hex::encode(blake2b_256(plaintext.as_bytes()))
}

/// Compare two byte strings in time independent of where they differ.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Whether `candidate` hashes to the stored hex digest.
pub fn digest_matches(candidate: &str, stored_hex: &str) -> bool {
    constant_time_eq(digest_hex(candidate).as_bytes(), stored_hex.as_bytes())
}
