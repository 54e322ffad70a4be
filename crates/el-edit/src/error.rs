//! Error types for the edit pipeline.

use thiserror::Error;

/// Result type for edit operations.
pub type EditResult<T> = Result<T, EditError>;

/// Hard failures of an edit batch. Guardrail adjustments are not errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EditError {
    /// The path names no writable leaf; the whole batch is rejected.
    #[error("Unsupported patch path '{path}'")]
    UnsupportedPath { path: String },

    /// The value cannot be coerced to the leaf type; the whole batch is rejected.
    #[error("Cannot convert {found} for '{path}': expected {expected}")]
    Conversion {
        path: String,
        expected: String,
        found: String,
    },

    /// Chamber geometry yields a non-positive clearance volume.
    #[error(
        "Non-physical geometry: clearance volume {clearance_m3} m^3 <= 0 (check chamber/dish/gasket/deck inputs)"
    )]
    NonPhysicalGeometry { clearance_m3: f64 },
}
