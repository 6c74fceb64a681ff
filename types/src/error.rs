use thiserror::Error;

/// Errors raised while parsing the fundamental types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid contact address: {0}")]
    InvalidContact(String),

    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("unknown applicant status: {0}")]
    UnknownStatus(String),

    #[error("invalid admission parameters: {reason}")]
    InvalidParams { reason: String },
}
