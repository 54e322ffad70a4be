//! Dyno curves and baseline-versus-current comparison.
//!
//! The physics behind a pull is not modelled here; a [`DynoRunner`] supplies
//! raw torque samples and this crate resamples, summarizes and differences
//! them.

pub mod compare;
pub mod curve;
pub mod error;
pub mod runner;
pub mod sweep;

pub use compare::{CompareMetrics, CompareResult, MIDRANGE_RPM, compare};
pub use curve::{DynoCurve, DynoPoint, HP_TORQUE_CONSTANT, Peaks};
pub use error::{DynoError, DynoResult};
pub use runner::DynoRunner;
pub use sweep::{DynoBasis, SweepConfig};
