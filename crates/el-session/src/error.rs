//! Error types for edit sessions.

use el_dyno::DynoError;
use el_edit::EditError;
use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
    #[error("Edit rejected: {0}")]
    Edit(#[from] EditError),

    #[error("Comparison failed: {0}")]
    Dyno(#[from] DynoError),
}
