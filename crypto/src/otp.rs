//! One-time codes and reset tokens.

use crate::Secret;
use rand::{Rng, RngCore};
use zeroize::Zeroize;

/// Random bytes behind a reset token (hex-encoded to twice this length).
pub const RESET_TOKEN_BYTES: usize = 32;

/// Generate a uniformly random decimal code of exactly `digits` digits
/// (zero-padded). `digits` outside `1..=9` is clamped; configured values
/// are range-checked by `AdmissionParams::validate` before they get here.
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R, digits: u32) -> Secret {
    let digits = digits.clamp(1, 9);
    let bound = 10u32.pow(digits);
    let value = rng.gen_range(0..bound);
    Secret::new(format!("{value:0width$}", width = digits as usize))
}

/// Generate an opaque, unguessable reset token.
pub fn generate_reset_token<R: RngCore + ?Sized>(rng: &mut R) -> Secret {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rng.fill_bytes(&mut bytes);
    let token = hex::encode(bytes);
    bytes.zeroize();
    Secret::new(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn codes_are_fixed_width_digits() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            let code = generate_code(&mut rng, 6);
            assert_eq!(code.len(), 6);
            assert!(code.expose().bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn leading_zeros_are_kept() {
        let mut rng = StdRng::seed_from_u64(11);
        let padded = (0..5000)
            .map(|_| generate_code(&mut rng, 6))
            .any(|c| c.expose().starts_with('0'));
        assert!(padded);
    }

    #[test]
    fn tokens_are_hex_and_distinct() {
        let mut rng = StdRng::seed_from_u64(5);
        let a = generate_reset_token(&mut rng);
        let b = generate_reset_token(&mut rng);
        assert_eq!(a.len(), RESET_TOKEN_BYTES * 2);
        assert!(a.expose().bytes().all(|b| b.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
