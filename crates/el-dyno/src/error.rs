//! Error types for dyno curves and comparisons.

use thiserror::Error;

/// Result type for dyno operations.
pub type DynoResult<T> = Result<T, DynoError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DynoError {
    /// Sweep bounds or step cannot produce a grid.
    #[error("Invalid sweep: {what}")]
    InvalidSweep { what: String },

    /// Sample rpm values must be strictly increasing.
    #[error("Curve rpm not increasing at index {index}: {rpm} after {previous_rpm}")]
    NonMonotonicCurve {
        index: usize,
        previous_rpm: u32,
        rpm: u32,
    },

    /// The runner failed to produce a pull.
    #[error("Runner failed: {message}")]
    Runner { message: String },
}

impl DynoError {
    pub fn runner(message: impl Into<String>) -> Self {
        Self::Runner {
            message: message.into(),
        }
    }
}
