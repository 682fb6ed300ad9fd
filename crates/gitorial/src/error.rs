use thiserror::Error;

use crate::navigate::Refusal;

pub type Result<T> = std::result::Result<T, GitorialError>;

/// Errors from building, loading, or driving a tutorial.
#[derive(Debug, Error)]
pub enum GitorialError {
    #[error("tutorial has no steps")]
    NoSteps,

    #[error("duplicate step id: {0}")]
    DuplicateStepId(String),

    /// A navigation request that was declined without touching state.
    ///
    /// Boundaries and malformed authoring end up here. Callers usually turn
    /// this into an informational message rather than a failure.
    #[error("{0}")]
    Refused(#[from] Refusal),

    #[error("version control error: {0}")]
    VersionControl(String),

    #[error("state store error: {0}")]
    Store(String),

    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl GitorialError {
    /// The refusal behind this error, if it is one.
    pub fn as_refusal(&self) -> Option<&Refusal> {
        match self {
            GitorialError::Refused(refusal) => Some(refusal),
            _ => None,
        }
    }
}
