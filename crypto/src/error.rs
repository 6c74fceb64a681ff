use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid hashing parameters: {0}")]
    Params(String),

    #[error("secret hashing failed: {0}")]
    Hash(String),
}
