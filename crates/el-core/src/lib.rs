//! el-core: numeric and unit helpers shared by the enginelab crates.
//!
//! - `numeric`: tolerances, finiteness checks, step quantization
//! - `units`: millimetre and cubic-centimetre conversions on top of `uom`
//! - `error`: [`CoreError`]

pub mod error;
pub mod numeric;
pub mod units;

pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use units::*;
