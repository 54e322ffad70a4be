//! Error types for the engine model.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while naming parts of the model.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A dotted path that names no writable leaf.
    #[error("Unknown field path '{path}'")]
    UnknownPath { path: String },

    /// Text that matches no variant of a named enumeration.
    #[error("Unknown {kind} '{name}'")]
    UnknownVariant { kind: &'static str, name: String },
}
