//! Pull simulation seam.

use el_model::EngineSpec;

use crate::{DynoCurve, DynoResult, SweepConfig};

/// Produces a raw torque curve for an engine over a sweep.
///
/// Implementations are treated as stateless services and may be called from
/// several threads at once. The returned curve may be empty and need not sit
/// on the sweep grid.
pub trait DynoRunner: Sync {
    fn simulate_pull(&self, spec: &EngineSpec, sweep: &SweepConfig) -> DynoResult<DynoCurve>;
}

impl<F> DynoRunner for F
where
    F: Fn(&EngineSpec, &SweepConfig) -> DynoResult<DynoCurve> + Sync,
{
    fn simulate_pull(&self, spec: &EngineSpec, sweep: &SweepConfig) -> DynoResult<DynoCurve> {
        self(spec, sweep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use el_model::presets;

    struct Flat(f64);

    impl DynoRunner for Flat {
        fn simulate_pull(&self, _: &EngineSpec, sweep: &SweepConfig) -> DynoResult<DynoCurve> {
            DynoCurve::from_samples(sweep.grid().map(|rpm| (rpm, self.0)))
        }
    }

    #[test]
    fn struct_and_closure_runners() {
        let spec = presets::b6_minimal();
        let sweep = SweepConfig::new(2000, 3000, 500);

        let curve = Flat(100.0).simulate_pull(&spec, &sweep).unwrap();
        assert_eq!(curve.len(), 3);

        let scaled = |spec: &EngineSpec, sweep: &SweepConfig| {
            DynoCurve::from_samples(sweep.grid().map(|rpm| (rpm, spec.bore_mm)))
        };
        let curve = scaled.simulate_pull(&spec, &sweep).unwrap();
        assert!(curve.iter().all(|p| p.torque_nm == 78.0));
    }
}
