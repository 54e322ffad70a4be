//! Sweep configuration for a simulated pull.

use serde::{Deserialize, Serialize};

use crate::{DynoError, DynoResult};

/// Where torque is measured. Passed through to the runner untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DynoBasis {
    #[default]
    Wheel,
    Crank,
}

/// Uniform rpm grid `rpm_start, rpm_start + step_rpm, ..` up to `rpm_stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub rpm_start: u32,
    pub rpm_stop: u32,
    pub step_rpm: u32,
    pub basis: DynoBasis,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            rpm_start: 1500,
            rpm_stop: 7500,
            step_rpm: 100,
            basis: DynoBasis::Wheel,
        }
    }
}

impl SweepConfig {
    pub fn new(rpm_start: u32, rpm_stop: u32, step_rpm: u32) -> Self {
        Self {
            rpm_start,
            rpm_stop,
            step_rpm,
            ..Self::default()
        }
    }

    pub fn with_basis(mut self, basis: DynoBasis) -> Self {
        self.basis = basis;
        self
    }

    pub fn validate(&self) -> DynoResult<()> {
        if self.step_rpm == 0 {
            return Err(DynoError::InvalidSweep {
                what: "step_rpm must be positive".to_string(),
            });
        }
        if self.rpm_stop < self.rpm_start {
            return Err(DynoError::InvalidSweep {
                what: format!(
                    "rpm_stop {} is below rpm_start {}",
                    self.rpm_stop, self.rpm_start
                ),
            });
        }
        Ok(())
    }

    /// Grid rpm values; empty when the sweep is invalid.
    pub fn grid(&self) -> impl Iterator<Item = u32> + '_ {
        let step = self.step_rpm;
        let stop = self.rpm_stop;
        let first = (step > 0 && self.rpm_start <= stop).then_some(self.rpm_start);
        std::iter::successors(first, move |&rpm| {
            rpm.checked_add(step).filter(|&next| next <= stop)
        })
    }

    /// Number of grid points.
    pub fn point_count(&self) -> usize {
        if self.validate().is_err() {
            return 0;
        }
        ((self.rpm_stop - self.rpm_start) / self.step_rpm) as usize + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sweep() {
        let sweep = SweepConfig::default();
        assert_eq!(sweep.rpm_start, 1500);
        assert_eq!(sweep.rpm_stop, 7500);
        assert_eq!(sweep.step_rpm, 100);
        assert_eq!(sweep.basis, DynoBasis::Wheel);
        assert!(sweep.validate().is_ok());
        assert_eq!(sweep.point_count(), 61);
        assert_eq!(sweep.grid().count(), 61);
    }

    #[test]
    fn rejects_zero_step_and_inverted_range() {
        assert!(matches!(
            SweepConfig::new(1000, 2000, 0).validate(),
            Err(DynoError::InvalidSweep { .. })
        ));
        assert!(matches!(
            SweepConfig::new(3000, 2000, 100).validate(),
            Err(DynoError::InvalidSweep { .. })
        ));
        assert_eq!(SweepConfig::new(3000, 2000, 100).grid().count(), 0);
    }

    #[test]
    fn grid_stops_at_or_before_stop() {
        let rpms: Vec<u32> = SweepConfig::new(1000, 1250, 100).grid().collect();
        assert_eq!(rpms, vec![1000, 1100, 1200]);

        let single: Vec<u32> = SweepConfig::new(4000, 4000, 250).grid().collect();
        assert_eq!(single, vec![4000]);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let sweep: SweepConfig = serde_json::from_str(r#"{"rpm_stop": 6000, "basis": "Crank"}"#).unwrap();
        assert_eq!(sweep.rpm_start, 1500);
        assert_eq!(sweep.rpm_stop, 6000);
        assert_eq!(sweep.basis, DynoBasis::Crank);
    }
}
