//! Float helpers shared by the edit pipeline.

use crate::{CoreError, CoreResult};

/// Scalar type for engine quantities.
pub type Real = f64;

/// Absolute and relative slack for float comparisons.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

/// `a` and `b` agree within `tol.abs`, or within `tol.rel` of the larger
/// magnitude.
pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    diff <= tol.abs || diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> CoreResult<Real> {
    if !v.is_finite() {
        return Err(CoreError::NonFinite { what, value: v });
    }
    Ok(v)
}

/// Number of decimal places needed to write `step` exactly (capped at 12).
fn step_decimals(step: Real) -> i32 {
    let mut scaled = step;
    let mut decimals = 0;
    while decimals < 12 && (scaled - scaled.round()).abs() > 1e-9 * scaled.abs().max(1.0) {
        scaled *= 10.0;
        decimals += 1;
    }
    decimals
}

/// Round `value` to the nearest multiple of `step`.
///
/// A non-positive step leaves the value untouched. The result is snapped to
/// the decimal precision of `step`, so `quantize(quantize(v, s), s)` returns
/// the same bits as `quantize(v, s)` and bounds that are exact multiples of
/// the step survive quantization unchanged.
pub fn quantize(value: Real, step: Real) -> Real {
    if step.is_nan() || step <= 0.0 || !value.is_finite() {
        return value;
    }
    let raw = (value / step).round() * step;
    let factor = 10f64.powi(step_decimals(step));
    (raw * factor).round() / factor
}

/// True when `value` is an integer multiple of `step` within `tol`.
pub fn is_multiple_of(value: Real, step: Real, tol: Tolerances) -> bool {
    if step.is_nan() || step <= 0.0 {
        return true;
    }
    let ratio = value / step;
    nearly_equal(ratio, ratio.round(), tol)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn quantize_is_idempotent(v in -1.0e4_f64..1.0e4_f64, step in prop::sample::select(vec![0.01, 0.05, 0.1, 1.0, 5.0, 50.0])) {
            let once = quantize(v, step);
            prop_assert_eq!(quantize(once, step), once);
        }

        #[test]
        fn quantize_lands_on_step(v in -1.0e4_f64..1.0e4_f64, step in prop::sample::select(vec![0.01, 0.1, 1.0, 50.0])) {
            let tol = Tolerances { abs: 1e-9, rel: 1e-9 };
            prop_assert!(is_multiple_of(quantize(v, step), step, tol));
        }
    }
}
