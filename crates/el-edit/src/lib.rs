//! Edit pipeline primitives for enginelab.
//!
//! An edit flows through three stages, each a plain function over immutable
//! snapshots:
//!
//! - **constraints**: per-field range, quantization step and enablement,
//!   evaluated against the current snapshot ([`ConstraintRegistry`])
//! - **apply**: writes an ordered batch of path/value edits into a copy of
//!   the snapshot, all or nothing ([`apply`])
//! - **derive**: recomputes dependent quantities such as the compression
//!   ratio from chamber geometry ([`resolve_derived`])

pub mod apply;
pub mod constraints;
pub mod derive;
pub mod error;
pub mod patch;

pub use apply::{apply, apply_edits};
pub use constraints::{
    ClampOutcome, Constraint, ConstraintRegistry, ConstraintTemplate, DynamicRule, EnabledWhen,
    GuardNote,
};
pub use derive::{
    Derived, compression_ratio_from_geometry, displacement_liters, mean_piston_speed_mps,
    resolve_derived,
};
pub use error::{EditError, EditResult};
pub use patch::{EditOp, FieldEdit, Patch};
