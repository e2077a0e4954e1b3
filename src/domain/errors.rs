//! Domain errors for the Summit search engine.

use thiserror::Error;

/// Domain-level errors that can occur during a search run.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Candidate generation failed: {0}")]
    Generation(String),

    #[error("Verification failed to run: {0}")]
    Verification(String),

    #[error("Workspace error: {0}")]
    Workspace(String),

    #[error("Timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("All {attempted} candidates failed to generate; nothing to verify")]
    AllCandidatesFailed { attempted: usize },

    #[error("Task has no verification command or script")]
    MissingVerification,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
