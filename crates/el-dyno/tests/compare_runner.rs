//! Comparator behaviour against closure and stateful runners.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use el_dyno::{
    DynoBasis, DynoCurve, DynoError, DynoResult, DynoRunner, MIDRANGE_RPM, SweepConfig, compare,
};
use el_model::{EngineSpec, presets};

/// Torque hump centred on an rpm that follows intake cam duration.
fn cam_runner(spec: &EngineSpec, _sweep: &SweepConfig) -> DynoResult<DynoCurve> {
    let centre = spec.cam.intake_duration_deg050 * 20.0;
    DynoCurve::from_samples((10..=80).map(|i| {
        let rpm = i * 100;
        let x = (f64::from(rpm) - centre) / 2500.0;
        (rpm, 150.0 * (1.0 - x * x).max(0.2))
    }))
}

#[test]
fn longer_cam_moves_peak_torque_up() {
    let base = presets::b6_minimal();
    let mut curr = base.clone();
    curr.cam.intake_duration_deg050 = 260.0;

    let sweep = SweepConfig::default();
    let result = compare(&base, &curr, &sweep, &cam_runner).unwrap();

    assert_eq!(result.baseline.len(), 61);
    assert_eq!(result.current.len(), 61);
    assert_eq!(result.delta.len(), 61);
    assert_eq!(result.metrics.baseline_peak_torque.rpm, 4600);
    assert_eq!(result.metrics.current_peak_torque.rpm, 5200);
    assert!(result.metrics.peak_power_gain() > 0.0);
    assert!(result.metrics.midrange_avg_torque_gain < 0.0);

    for (i, p) in result.delta.iter().enumerate() {
        let expected = result.current.points()[i].torque_nm - result.baseline.points()[i].torque_nm;
        assert_eq!(p.rpm, 1500 + 100 * i as u32);
        assert!((p.torque_nm - expected).abs() < 1e-12);
    }
}

#[test]
fn sparse_runner_output_is_resampled_to_grid() {
    let sparse = |_: &EngineSpec, _: &SweepConfig| -> DynoResult<DynoCurve> {
        DynoCurve::from_samples([(2000, 100.0), (6000, 180.0)])
    };
    let spec = presets::b6_minimal();
    let sweep = SweepConfig::new(1000, 7000, 1000);
    let result = compare(&spec, &spec, &sweep, &sparse).unwrap();

    let torques: Vec<f64> = result.baseline.iter().map(|p| p.torque_nm).collect();
    assert_eq!(torques, vec![100.0, 100.0, 120.0, 140.0, 160.0, 180.0, 180.0]);
}

struct CountingRunner {
    calls: AtomicUsize,
    bases: Mutex<Vec<DynoBasis>>,
}

impl DynoRunner for CountingRunner {
    fn simulate_pull(&self, _: &EngineSpec, sweep: &SweepConfig) -> DynoResult<DynoCurve> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut bases) = self.bases.lock() {
            bases.push(sweep.basis);
        }
        DynoCurve::from_samples(sweep.grid().map(|rpm| (rpm, 120.0)))
    }
}

#[test]
fn runner_called_once_per_snapshot_with_basis_passed_through() {
    let runner = CountingRunner {
        calls: AtomicUsize::new(0),
        bases: Mutex::new(Vec::new()),
    };
    let spec = presets::b6_minimal();
    let sweep = SweepConfig::new(2000, 5000, 500).with_basis(DynoBasis::Crank);
    compare(&spec, &spec, &sweep, &runner).unwrap();

    assert_eq!(runner.calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        *runner.bases.lock().unwrap(),
        vec![DynoBasis::Crank, DynoBasis::Crank]
    );
}

#[test]
fn trait_object_runner() {
    let runner: Box<dyn DynoRunner> = Box::new(cam_runner);
    let spec = presets::b6_minimal();
    let result = compare(&spec, &spec, &SweepConfig::default(), runner.as_ref()).unwrap();
    assert_eq!(result.metrics.peak_torque_gain(), 0.0);
}

#[test]
fn midrange_window_is_fixed() {
    assert_eq!(MIDRANGE_RPM, (2500, 4500));
}

#[test]
fn non_monotonic_runner_output_is_an_error() {
    let broken = |_: &EngineSpec, _: &SweepConfig| -> DynoResult<DynoCurve> {
        DynoCurve::from_samples([(3000, 1.0), (2000, 1.0)])
    };
    let spec = presets::b6_minimal();
    let err = compare(&spec, &spec, &SweepConfig::default(), &broken).unwrap_err();
    assert!(matches!(err, DynoError::NonMonotonicCurve { index: 1, .. }));
}
