//! Credential primitives for the matric admission core.
//!
//! - **Temporary secrets** with one character from each class, shuffled
//! - **One-time codes** (zero-padded decimal) and opaque **reset tokens**
//! - **Argon2id** for hashing account secrets
//! - **Blake2b** digests with constant-time comparison for codes and tokens at rest

pub mod error;
pub mod hash;
pub mod otp;
pub mod password;
pub mod policy;
pub mod secret;

pub use error::CryptoError;
pub use hash::{blake2b_256, constant_time_eq, digest_hex, digest_matches};
pub use otp::{generate_code, generate_reset_token, RESET_TOKEN_BYTES};
pub use password::SecretHasher;
pub use policy::{check_strength, WeakSecret};
pub use secret::{generate_temporary_secret, Secret, MIN_TEMPORARY_SECRET_LEN};
