//! Document storage collaborator, used only for rejection cleanup.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document {0} not found")]
    NotFound(String),

    #[error("document store error: {0}")]
    Backend(String),
}

pub trait DocumentStore: Send + Sync {
    /// Delete the stored artifact behind `reference`.
    fn delete(&self, reference: &str) -> Result<(), DocumentError>;
}
