//! Baseline-versus-current dyno comparison.

use std::time::Instant;

use el_model::EngineSpec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{DynoCurve, DynoPoint, DynoResult, DynoRunner, SweepConfig};

/// Rpm window used for the midrange average torque metric.
pub const MIDRANGE_RPM: (u32, u32) = (2500, 4500);

/// Summary of a comparison. Gains are current minus baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CompareMetrics {
    pub baseline_peak_power: DynoPoint,
    pub baseline_peak_torque: DynoPoint,
    pub current_peak_power: DynoPoint,
    pub current_peak_torque: DynoPoint,
    pub midrange_avg_torque_gain: f64,
}

impl CompareMetrics {
    pub fn peak_power_gain(&self) -> f64 {
        self.current_peak_power.power_hp - self.baseline_peak_power.power_hp
    }

    pub fn peak_torque_gain(&self) -> f64 {
        self.current_peak_torque.torque_nm - self.baseline_peak_torque.torque_nm
    }
}

/// Both resampled curves, their point-wise difference and summary metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompareResult {
    pub baseline: DynoCurve,
    pub current: DynoCurve,
    pub delta: DynoCurve,
    pub metrics: CompareMetrics,
}

/// Run both pulls, resample them onto the sweep grid and difference them.
///
/// The two runner calls execute concurrently. The delta pairs points by
/// index; if the resampled curves differ in length the longer tail is
/// dropped.
pub fn compare<R>(
    baseline: &EngineSpec,
    current: &EngineSpec,
    sweep: &SweepConfig,
    runner: &R,
) -> DynoResult<CompareResult>
where
    R: DynoRunner + ?Sized,
{
    sweep.validate()?;

    let started = Instant::now();
    let (base_raw, curr_raw) = rayon::join(
        || runner.simulate_pull(baseline, sweep),
        || runner.simulate_pull(current, sweep),
    );
    let (base_raw, curr_raw) = (base_raw?, curr_raw?);
    debug!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        baseline_points = base_raw.len(),
        current_points = curr_raw.len(),
        "dyno pulls finished"
    );

    let base = base_raw.resample_to(sweep);
    let curr = curr_raw.resample_to(sweep);

    if base.len() != curr.len() {
        warn!(
            baseline_points = base.len(),
            current_points = curr.len(),
            "resampled curve lengths differ; truncating delta"
        );
    }
    let delta = delta_curve(&base, &curr);

    let base_peaks = base.peaks().unwrap_or_default();
    let curr_peaks = curr.peaks().unwrap_or_default();
    let (lo, hi) = MIDRANGE_RPM;
    let metrics = CompareMetrics {
        baseline_peak_power: base_peaks.power,
        baseline_peak_torque: base_peaks.torque,
        current_peak_power: curr_peaks.power,
        current_peak_torque: curr_peaks.torque,
        midrange_avg_torque_gain: curr.average_torque_in(lo, hi) - base.average_torque_in(lo, hi),
    };

    Ok(CompareResult {
        baseline: base,
        current: curr,
        delta,
        metrics,
    })
}

/// Index-paired torque difference at the baseline's rpm.
fn delta_curve(base: &DynoCurve, curr: &DynoCurve) -> DynoCurve {
    // rpm order is inherited from the baseline
    DynoCurve::from_ordered(
        base.iter()
            .zip(curr.iter())
            .map(|(a, b)| DynoPoint::new(a.rpm, b.torque_nm - a.torque_nm))
            .collect(),
    )
}
