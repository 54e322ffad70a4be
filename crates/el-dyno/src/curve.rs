//! Torque/power curves over rpm.
//!
//! A curve is an rpm-ordered list of points. Power is always derived from
//! torque, never stored independently of it.

use serde::{Deserialize, Serialize};

use crate::{DynoError, DynoResult, SweepConfig};

/// Divisor turning torque times rpm into power.
pub const HP_TORQUE_CONSTANT: f64 = 5252.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DynoPoint {
    pub rpm: u32,
    pub torque_nm: f64,
    pub power_hp: f64,
}

impl DynoPoint {
    pub fn new(rpm: u32, torque_nm: f64) -> Self {
        Self {
            rpm,
            torque_nm,
            power_hp: torque_nm * f64::from(rpm) / HP_TORQUE_CONSTANT,
        }
    }
}

/// Peak power and peak torque points of a curve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Peaks {
    pub power: DynoPoint,
    pub torque: DynoPoint,
}

/// Points with strictly increasing rpm.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DynoPoint>", into = "Vec<DynoPoint>")]
pub struct DynoCurve {
    points: Vec<DynoPoint>,
}

impl DynoCurve {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a curve from `(rpm, torque)` samples, deriving power.
    pub fn from_samples(samples: impl IntoIterator<Item = (u32, f64)>) -> DynoResult<Self> {
        let points = samples
            .into_iter()
            .map(|(rpm, torque)| DynoPoint::new(rpm, torque))
            .collect();
        Self::from_points(points)
    }

    /// Wrap points after checking that rpm strictly increases.
    pub fn from_points(points: Vec<DynoPoint>) -> DynoResult<Self> {
        if let Some(index) = points.windows(2).position(|w| w[1].rpm <= w[0].rpm) {
            return Err(DynoError::NonMonotonicCurve {
                index: index + 1,
                previous_rpm: points[index].rpm,
                rpm: points[index + 1].rpm,
            });
        }
        Ok(Self { points })
    }

    /// Wrap points whose rpm order is already known to be strictly increasing.
    pub(crate) fn from_ordered(points: Vec<DynoPoint>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].rpm < w[1].rpm));
        Self { points }
    }

    pub fn points(&self) -> &[DynoPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DynoPoint> {
        self.points.iter()
    }

    /// Linear interpolation of torque onto the grid `rpm_start..=rpm_stop`
    /// with spacing `step`.
    ///
    /// The bracketing cursor only moves forward. Targets outside the source
    /// range hold the nearest sample's torque. An empty source, a zero step
    /// or an inverted range yield an empty curve.
    pub fn resample(&self, rpm_start: u32, rpm_stop: u32, step: u32) -> DynoCurve {
        let n = self.points.len();
        if n == 0 {
            return DynoCurve::new();
        }

        let grid = SweepConfig::new(rpm_start, rpm_stop, step);
        let mut points = Vec::with_capacity(grid.point_count());
        let mut j = 0;
        for rpm in grid.grid() {
            while j + 2 < n && self.points[j + 1].rpm < rpm {
                j += 1;
            }
            let a = self.points[j];
            let b = self.points[(j + 1).min(n - 1)];
            let t = if b.rpm == a.rpm {
                0.0
            } else {
                let span = f64::from(b.rpm) - f64::from(a.rpm);
                ((f64::from(rpm) - f64::from(a.rpm)) / span).clamp(0.0, 1.0)
            };
            let torque = a.torque_nm + t * (b.torque_nm - a.torque_nm);
            points.push(DynoPoint::new(rpm, torque));
        }
        DynoCurve { points }
    }

    /// Resample onto a sweep's grid.
    pub fn resample_to(&self, sweep: &SweepConfig) -> DynoCurve {
        self.resample(sweep.rpm_start, sweep.rpm_stop, sweep.step_rpm)
    }

    /// Highest power and highest torque points; the first one wins ties.
    pub fn peaks(&self) -> Option<Peaks> {
        let first = *self.points.first()?;
        let mut peaks = Peaks {
            power: first,
            torque: first,
        };
        for p in &self.points {
            if p.power_hp > peaks.power.power_hp {
                peaks.power = *p;
            }
            if p.torque_nm > peaks.torque.torque_nm {
                peaks.torque = *p;
            }
        }
        Some(peaks)
    }

    /// Trapezoidal mean torque between `rpm_a` and `rpm_b`.
    ///
    /// Points below `rpm_a` only move the anchor. The first point at or
    /// above `rpm_a` integrates back to that anchor, so the leading
    /// trapezoid may start before `rpm_a`. Integration stops at the first
    /// point above `rpm_b`. The area is divided by `max(1, rpm_b - rpm_a)`.
    pub fn average_torque_in(&self, rpm_a: u32, rpm_b: u32) -> f64 {
        let Some(first) = self.points.first() else {
            return 0.0;
        };
        let mut area = 0.0;
        let mut last_rpm = first.rpm;
        let mut last_torque = first.torque_nm;
        for p in &self.points {
            if p.rpm < rpm_a {
                last_rpm = p.rpm;
                last_torque = p.torque_nm;
                continue;
            }
            if p.rpm > rpm_b {
                break;
            }
            area += 0.5 * (p.torque_nm + last_torque) * (f64::from(p.rpm) - f64::from(last_rpm));
            last_rpm = p.rpm;
            last_torque = p.torque_nm;
        }
        let width = (i64::from(rpm_b) - i64::from(rpm_a)).max(1);
        area / width as f64
    }
}

impl TryFrom<Vec<DynoPoint>> for DynoCurve {
    type Error = DynoError;

    fn try_from(points: Vec<DynoPoint>) -> Result<Self, Self::Error> {
        Self::from_points(points)
    }
}

impl From<DynoCurve> for Vec<DynoPoint> {
    fn from(curve: DynoCurve) -> Self {
        curve.points
    }
}

impl<'a> IntoIterator for &'a DynoCurve {
    type Item = &'a DynoPoint;
    type IntoIter = std::slice::Iter<'a, DynoPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve(samples: &[(u32, f64)]) -> DynoCurve {
        DynoCurve::from_samples(samples.iter().copied()).unwrap()
    }

    #[test]
    fn power_follows_torque() {
        let p = DynoPoint::new(5252, 200.0);
        assert!((p.power_hp - 200.0).abs() < 1e-12);
        assert_eq!(DynoPoint::new(0, 150.0).power_hp, 0.0);
    }

    #[test]
    fn from_samples_rejects_repeated_rpm() {
        let err = DynoCurve::from_samples([(1000, 1.0), (2000, 2.0), (2000, 3.0)]).unwrap_err();
        assert_eq!(
            err,
            DynoError::NonMonotonicCurve {
                index: 2,
                previous_rpm: 2000,
                rpm: 2000
            }
        );
    }

    #[test]
    fn resample_interpolates_linearly() {
        let c = curve(&[(2000, 100.0), (3000, 120.0), (5000, 160.0)]);
        let r = c.resample(2000, 5000, 500);
        let torques: Vec<f64> = r.iter().map(|p| p.torque_nm).collect();
        assert_eq!(torques, vec![100.0, 110.0, 120.0, 130.0, 140.0, 150.0, 160.0]);
        assert!((r.points()[2].power_hp - 120.0 * 3000.0 / 5252.0).abs() < 1e-12);
    }

    #[test]
    fn resample_holds_edges_flat() {
        let c = curve(&[(2000, 100.0), (3000, 120.0)]);
        let r = c.resample(1000, 4000, 1000);
        let torques: Vec<f64> = r.iter().map(|p| p.torque_nm).collect();
        assert_eq!(torques, vec![100.0, 100.0, 120.0, 120.0]);
    }

    #[test]
    fn resample_single_point_is_constant() {
        let c = curve(&[(3000, 90.0)]);
        let r = c.resample(1000, 5000, 1000);
        assert_eq!(r.len(), 5);
        assert!(r.iter().all(|p| p.torque_nm == 90.0));
    }

    #[test]
    fn resample_degenerate_grids_are_empty() {
        let c = curve(&[(2000, 100.0), (3000, 120.0)]);
        assert!(c.resample(1000, 4000, 0).is_empty());
        assert!(c.resample(4000, 1000, 100).is_empty());
        assert!(DynoCurve::new().resample(1000, 4000, 100).is_empty());
    }

    #[test]
    fn peaks_first_wins_ties() {
        let c = curve(&[(2000, 150.0), (3000, 150.0), (4000, 140.0)]);
        let peaks = c.peaks().unwrap();
        assert_eq!(peaks.torque.rpm, 2000);
        assert_eq!(peaks.power.rpm, 4000);
        assert_eq!(DynoCurve::new().peaks(), None);
    }

    #[test]
    fn average_torque_keeps_leading_trapezoid() {
        let two_point = curve(&[(2000, 100.0), (5000, 160.0)]);
        assert_eq!(two_point.average_torque_in(2500, 4500), 0.0);

        let three_point = curve(&[(2000, 100.0), (3000, 120.0), (5000, 160.0)]);
        // (100 + 120) / 2 * 1000 over a 2000 rpm window
        assert!((three_point.average_torque_in(2500, 4500) - 55.0).abs() < 1e-12);
    }

    #[test]
    fn average_torque_inside_window() {
        let c = curve(&[(2500, 100.0), (3500, 100.0), (4500, 100.0)]);
        assert!((c.average_torque_in(2500, 4500) - 100.0).abs() < 1e-12);
        assert_eq!(DynoCurve::new().average_torque_in(2500, 4500), 0.0);
    }

    #[test]
    fn average_torque_degenerate_window_divides_by_one() {
        let c = curve(&[(3000, 80.0), (3001, 82.0)]);
        assert!((c.average_torque_in(3001, 3001) - 81.0).abs() < 1e-12);
    }

    #[test]
    fn deserialization_validates_order() {
        let ok: DynoCurve =
            serde_json::from_str(r#"[{"rpm":1000,"torque_nm":1.0,"power_hp":0.0}]"#).unwrap();
        assert_eq!(ok.len(), 1);

        let bad = serde_json::from_str::<DynoCurve>(
            r#"[{"rpm":2000,"torque_nm":1.0,"power_hp":0.0},{"rpm":1000,"torque_nm":1.0,"power_hp":0.0}]"#,
        );
        assert!(bad.is_err());
    }
}
