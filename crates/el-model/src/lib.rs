//! el-model: the engine configuration snapshot and its addressing scheme.
//!
//! An [`EngineSpec`] is a plain value. Editing never mutates a snapshot in
//! place: callers clone, write leaves through a [`FieldPath`], and keep the
//! old value around as history or a baseline.

pub mod enums;
pub mod error;
pub mod path;
pub mod presets;
pub mod spec;
pub mod value;

pub use enums::{
    Architecture, CompressionBehavior, FuelType, HeaderLayout, InjectionType, NamedVariant,
};
pub use error::{ModelError, ModelResult};
pub use path::{FieldChange, FieldPath, LeafKind, diff};
pub use spec::*;
pub use value::PatchValue;
