//! Per-field edit policy: range, quantization step and enablement.
//!
//! Templates are static. The policy that applies to one edit is computed
//! fresh from the template plus the current snapshot ([`Constraint`]); the
//! registry itself is never mutated after construction and can be shared
//! across sessions.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use el_core::quantize;
use el_model::{CompressionBehavior, EngineSpec, FieldPath, HeaderLayout, LeafKind, PatchValue};
use serde::Serialize;

/// Condition on the current snapshot under which a field may be edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnabledWhen {
    /// Exhaust header is one of the listed layouts.
    HeaderIn(&'static [HeaderLayout]),
    /// Compression policy is set to derive the ratio from chamber geometry.
    GeometryDefinesCr,
    /// The compression ratio is an input rather than derived.
    CompressionRatioIsInput,
    /// A short runner length exists, so a switch rpm means something.
    DualRunner,
}

impl EnabledWhen {
    pub fn holds(self, spec: &EngineSpec) -> bool {
        match self {
            Self::HeaderIn(layouts) => layouts.contains(&spec.header),
            Self::GeometryDefinesCr => {
                spec.toggles.compression_behavior == CompressionBehavior::GeometryDefinesCr
            }
            Self::CompressionRatioIsInput => !spec.geometry_defines_cr(),
            Self::DualRunner => spec.runner_length_short_mm.is_some(),
        }
    }
}

/// Named rule that adjusts a template's bounds from the current snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicRule {
    /// The lower bound rises to the current value of another leaf but never
    /// drops below the template minimum. The followed value is rounded up
    /// onto the step grid so a clamped value is already quantized.
    MinFollows(FieldPath),
}

impl DynamicRule {
    fn apply(self, constraint: &mut Constraint, spec: &EngineSpec) {
        match self {
            Self::MinFollows(source) => {
                if let Some(floor) = source.read(spec).as_f64().filter(|v| v.is_finite()) {
                    let floor = ceil_to_step(floor, constraint.step);
                    constraint.min = Some(constraint.min.map_or(floor, |m| m.max(floor)));
                }
            }
        }
    }
}

/// Smallest multiple of `step` not below `value`.
fn ceil_to_step(value: f64, step: f64) -> f64 {
    let snapped = quantize(value, step);
    if snapped < value {
        quantize(snapped + step, step)
    } else {
        snapped
    }
}

/// Static policy for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintTemplate {
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Quantization step; `0` disables quantization.
    pub step: f64,
    pub enabled_when: Option<EnabledWhen>,
}

impl ConstraintTemplate {
    pub fn range(min: f64, max: f64, step: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            step,
            enabled_when: None,
        }
    }

    pub fn step(step: f64) -> Self {
        Self {
            min: None,
            max: None,
            step,
            enabled_when: None,
        }
    }

    pub fn enabled_when(mut self, condition: EnabledWhen) -> Self {
        self.enabled_when = Some(condition);
        self
    }
}

/// Policy in force for one field against one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constraint {
    pub path: FieldPath,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: f64,
    pub enabled: bool,
    /// False when no template exists and the constraint is the no-op default.
    pub registered: bool,
}

impl Constraint {
    /// No bounds, step 1, always enabled.
    pub fn unconstrained(path: FieldPath) -> Self {
        Self {
            path,
            min: None,
            max: None,
            step: 1.0,
            enabled: true,
            registered: false,
        }
    }
}

/// Why a requested value was not written verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum GuardNote {
    /// The field does not apply to the current configuration.
    Disabled,
    /// The value was pulled onto a bound.
    Clamped { to: f64 },
    /// The value was rounded onto the step grid.
    Quantized { to: f64 },
}

impl fmt::Display for GuardNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("disabled for current configuration"),
            Self::Clamped { to } => write!(f, "clamped to {to}"),
            Self::Quantized { to } => write!(f, "quantized to {to}"),
        }
    }
}

/// Result of running one raw value through the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct ClampOutcome {
    pub value: PatchValue,
    pub note: Option<GuardNote>,
}

impl ClampOutcome {
    fn unchanged(value: &PatchValue) -> Self {
        Self {
            value: value.clone(),
            note: None,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.note == Some(GuardNote::Disabled)
    }
}

/// Field templates plus the dynamic rules layered on top of them.
#[derive(Debug, Clone, Default)]
pub struct ConstraintRegistry {
    templates: BTreeMap<FieldPath, ConstraintTemplate>,
    rules: Vec<(FieldPath, DynamicRule)>,
}

static STANDARD: LazyLock<ConstraintRegistry> = LazyLock::new(ConstraintRegistry::build_standard);

const SPLIT_PRIMARY_HEADERS: &[HeaderLayout] =
    &[HeaderLayout::FourTwoOne, HeaderLayout::UnequalLength];

impl ConstraintRegistry {
    /// Registry with no templates: every field passes through untouched.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Shared registry holding the standard engine field policy.
    pub fn standard() -> &'static ConstraintRegistry {
        &STANDARD
    }

    pub fn with_template(mut self, path: FieldPath, template: ConstraintTemplate) -> Self {
        self.templates.insert(path, template);
        self
    }

    pub fn with_rule(mut self, path: FieldPath, rule: DynamicRule) -> Self {
        self.rules.push((path, rule));
        self
    }

    pub fn template(&self, path: FieldPath) -> Option<&ConstraintTemplate> {
        self.templates.get(&path)
    }

    /// Fields that carry a template, in path order.
    pub fn registered_paths(&self) -> impl Iterator<Item = FieldPath> + '_ {
        self.templates.keys().copied()
    }

    /// Template merged with the dynamic rules for `path`, evaluated on `spec`.
    pub fn effective(&self, path: FieldPath, spec: &EngineSpec) -> Constraint {
        let Some(template) = self.templates.get(&path) else {
            return Constraint::unconstrained(path);
        };

        let mut constraint = Constraint {
            path,
            min: template.min,
            max: template.max,
            step: template.step,
            enabled: template.enabled_when.is_none_or(|c| c.holds(spec)),
            registered: true,
        };
        for (_, rule) in self.rules.iter().filter(|(p, _)| *p == path) {
            rule.apply(&mut constraint, spec);
        }
        constraint
    }

    /// Coerce `raw` to the policy for `path`.
    ///
    /// Order: enablement, quantization, then the minimum and maximum bounds.
    /// Enablement applies to every registered field, enumerations included.
    /// Past that, fields without a template, enumerations, nulls and
    /// non-numeric text pass through unchanged; the applier decides whether
    /// they convert.
    pub fn clamp(&self, path: FieldPath, raw: &PatchValue, spec: &EngineSpec) -> ClampOutcome {
        let constraint = self.effective(path, spec);
        if !constraint.registered {
            return ClampOutcome::unchanged(raw);
        }
        if !constraint.enabled {
            return ClampOutcome {
                value: raw.clone(),
                note: Some(GuardNote::Disabled),
            };
        }
        if !path.kind().is_numeric() {
            return ClampOutcome::unchanged(raw);
        }
        let Some(requested) = raw.as_f64().filter(|v| v.is_finite()) else {
            return ClampOutcome::unchanged(raw);
        };

        let quantized = quantize(requested, constraint.step);
        let mut coerced = quantized;
        let mut note = None;
        if let Some(min) = constraint.min.filter(|&min| coerced < min) {
            coerced = min;
            note = Some(GuardNote::Clamped { to: min });
        } else if let Some(max) = constraint.max.filter(|&max| coerced > max) {
            coerced = max;
            note = Some(GuardNote::Clamped { to: max });
        }
        if note.is_none() && quantized != requested {
            note = Some(GuardNote::Quantized { to: quantized });
        }

        ClampOutcome {
            value: typed_value(path.kind(), coerced),
            note,
        }
    }

    fn build_standard() -> Self {
        use ConstraintTemplate as T;
        use FieldPath as P;

        Self::empty()
            // geometry
            .with_template(P::Cylinders, T::range(1.0, 16.0, 1.0))
            .with_template(P::BoreMm, T::range(60.0, 110.0, 0.1))
            .with_template(P::StrokeMm, T::range(50.0, 120.0, 0.1))
            .with_template(
                P::CompressionRatio,
                T::range(6.0, 16.0, 0.1).enabled_when(EnabledWhen::CompressionRatioIsInput),
            )
            .with_template(
                P::ChamberVolumeCc,
                T::range(20.0, 120.0, 0.1).enabled_when(EnabledWhen::GeometryDefinesCr),
            )
            .with_template(
                P::PistonDishVolumeCc,
                T::range(-20.0, 40.0, 0.1).enabled_when(EnabledWhen::GeometryDefinesCr),
            )
            .with_template(
                P::DeckClearanceMm,
                T::range(-1.0, 2.0, 0.01).enabled_when(EnabledWhen::GeometryDefinesCr),
            )
            .with_template(
                P::HeadGasketThicknessMm,
                T::range(0.3, 3.0, 0.05).enabled_when(EnabledWhen::GeometryDefinesCr),
            )
            .with_template(
                P::HeadGasketBoreMm,
                T::range(60.0, 115.0, 0.1).enabled_when(EnabledWhen::GeometryDefinesCr),
            )
            // head
            .with_template(P::IntakeValveDiameterMm, T::range(20.0, 50.0, 0.1))
            .with_template(P::ExhaustValveDiameterMm, T::range(18.0, 45.0, 0.1))
            // valvetrain
            .with_template(P::CamLobeSeparationDeg, T::range(98.0, 116.0, 1.0))
            .with_template(P::CamIntakeDurationDeg050, T::range(190.0, 320.0, 1.0))
            .with_template(P::CamExhaustDurationDeg050, T::range(190.0, 320.0, 1.0))
            .with_template(P::CamIntakeMaxLiftMm, T::range(5.0, 16.0, 0.1))
            .with_template(P::CamExhaustMaxLiftMm, T::range(5.0, 16.0, 0.1))
            // induction
            .with_template(P::RunnerLengthMm, T::range(180.0, 500.0, 5.0))
            .with_template(P::RunnerLengthShortMm, T::range(100.0, 400.0, 5.0))
            .with_template(
                P::RunnerSwitchToShortRpm,
                T::range(2000.0, 9000.0, 50.0).enabled_when(EnabledWhen::DualRunner),
            )
            .with_template(P::ThrottleDiameterMm, T::range(45.0, 80.0, 1.0))
            // exhaust
            .with_template(P::PrimaryLength1Mm, T::range(300.0, 800.0, 5.0))
            .with_template(
                P::PrimaryLength2Mm,
                T::range(300.0, 800.0, 5.0)
                    .enabled_when(EnabledWhen::HeaderIn(SPLIT_PRIMARY_HEADERS)),
            )
            .with_template(P::PrimaryIdMm, T::range(30.0, 45.0, 1.0))
            // fuel
            .with_template(P::AfrStoich, T::range(6.0, 17.5, 0.1))
            .with_template(P::WotLambda, T::range(0.80, 1.05, 0.01))
            .with_template(P::KnockOctaneRon, T::range(80.0, 120.0, 1.0))
            // limits
            .with_template(P::RedlineRpm, T::range(3000.0, 9500.0, 50.0))
            .with_template(P::RevLimitRpm, T::range(3200.0, 9800.0, 50.0))
            .with_rule(P::RevLimitRpm, DynamicRule::MinFollows(P::RedlineRpm))
            .with_template(P::SoftTaperRpm, T::range(0.0, 1500.0, 50.0))
    }
}

/// Keep integer leaves integral so re-clamping sees the same value.
fn typed_value(kind: LeafKind, v: f64) -> PatchValue {
    match kind {
        LeafKind::Int | LeafKind::OptionalInt if v.fract() == 0.0 && v.abs() < 1e15 => {
            PatchValue::Int(v as i64)
        }
        _ => PatchValue::Float(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use el_model::presets;

    fn registry() -> &'static ConstraintRegistry {
        ConstraintRegistry::standard()
    }

    #[test]
    fn unregistered_path_is_noop() {
        let spec = presets::b6_minimal();
        let c = registry().effective(FieldPath::PlenumVolumeCc, &spec);
        assert_eq!(c, Constraint::unconstrained(FieldPath::PlenumVolumeCc));
        assert_eq!(c.step, 1.0);

        let out = registry().clamp(FieldPath::PlenumVolumeCc, &PatchValue::Float(2150.7), &spec);
        assert_eq!(out.value, PatchValue::Float(2150.7));
        assert_eq!(out.note, None);
    }

    #[test]
    fn clamps_below_minimum() {
        let spec = presets::b6_minimal();
        let out = registry().clamp(FieldPath::BoreMm, &PatchValue::Float(40.0), &spec);
        assert_eq!(out.value, PatchValue::Float(60.0));
        assert_eq!(out.note, Some(GuardNote::Clamped { to: 60.0 }));
        assert_eq!(out.note.unwrap().to_string(), "clamped to 60");
    }

    #[test]
    fn clamps_above_maximum() {
        let spec = presets::b6_minimal();
        let out = registry().clamp(FieldPath::WotLambda, &PatchValue::from("1.3"), &spec);
        assert_eq!(out.value, PatchValue::Float(1.05));
        assert_eq!(out.note, Some(GuardNote::Clamped { to: 1.05 }));
    }

    #[test]
    fn quantizes_in_range_values() {
        let spec = presets::b6_minimal();
        let out = registry().clamp(FieldPath::BoreMm, &PatchValue::Float(81.04), &spec);
        assert_eq!(out.value, PatchValue::Float(81.0));
        assert_eq!(out.note, Some(GuardNote::Quantized { to: 81.0 }));

        let out = registry().clamp(FieldPath::BoreMm, &PatchValue::Float(81.0), &spec);
        assert_eq!(out.note, None);
    }

    #[test]
    fn integer_leaves_stay_integral() {
        let spec = presets::b6_minimal();
        let out = registry().clamp(FieldPath::RedlineRpm, &PatchValue::Int(7234), &spec);
        assert_eq!(out.value, PatchValue::Int(7250));
        assert_eq!(out.note, Some(GuardNote::Quantized { to: 7250.0 }));
    }

    #[test]
    fn rev_limit_floor_tracks_redline() {
        let mut spec = presets::b6_minimal();
        spec.redline_rpm = 8000;
        let c = registry().effective(FieldPath::RevLimitRpm, &spec);
        assert_eq!(c.min, Some(8000.0));

        let out = registry().clamp(FieldPath::RevLimitRpm, &PatchValue::Int(7500), &spec);
        assert_eq!(out.value, PatchValue::Int(8000));
        assert_eq!(out.note, Some(GuardNote::Clamped { to: 8000.0 }));
    }

    #[test]
    fn off_grid_redline_raises_floor_to_next_step() {
        let mut spec = presets::b6_minimal();
        spec.redline_rpm = 8025;
        let c = registry().effective(FieldPath::RevLimitRpm, &spec);
        assert_eq!(c.min, Some(8050.0));

        let once = registry().clamp(FieldPath::RevLimitRpm, &PatchValue::Int(7000), &spec);
        assert_eq!(once.value, PatchValue::Int(8050));
        assert_eq!(once.note, Some(GuardNote::Clamped { to: 8050.0 }));

        let twice = registry().clamp(FieldPath::RevLimitRpm, &once.value, &spec);
        assert_eq!(twice.value, PatchValue::Int(8050));
        assert_eq!(twice.note, None);
    }

    #[test]
    fn ceil_to_step_keeps_on_grid_values() {
        assert_eq!(ceil_to_step(8000.0, 50.0), 8000.0);
        assert_eq!(ceil_to_step(8001.0, 50.0), 8050.0);
        assert_eq!(ceil_to_step(0.7, 0.1), 0.7);
        assert_eq!(ceil_to_step(0.71, 0.1), 0.8);
        assert_eq!(ceil_to_step(12.3, 0.0), 12.3);
    }

    #[test]
    fn rev_limit_floor_never_below_template() {
        let mut spec = presets::b6_minimal();
        spec.redline_rpm = 1000;
        let c = registry().effective(FieldPath::RevLimitRpm, &spec);
        assert_eq!(c.min, Some(3200.0));
    }

    #[test]
    fn second_primary_disabled_for_four_into_one() {
        let mut spec = presets::b6_minimal();
        spec.header = HeaderLayout::FourIntoOne;
        let out = registry().clamp(FieldPath::PrimaryLength2Mm, &PatchValue::Float(1234.0), &spec);
        assert!(out.is_disabled());
        assert_eq!(out.value, PatchValue::Float(1234.0));
        assert_eq!(
            out.note.unwrap().to_string(),
            "disabled for current configuration"
        );

        spec.header = HeaderLayout::UnequalLength;
        let out = registry().clamp(FieldPath::PrimaryLength2Mm, &PatchValue::Float(1234.0), &spec);
        assert_eq!(out.value, PatchValue::Float(800.0));
    }

    #[test]
    fn compression_ratio_disabled_when_derived() {
        let derived = presets::b6_with_chamber();
        assert!(!registry().effective(FieldPath::CompressionRatio, &derived).enabled);

        let direct = presets::b6_minimal();
        assert!(registry().effective(FieldPath::CompressionRatio, &direct).enabled);
    }

    #[test]
    fn non_numeric_values_pass_through() {
        let spec = presets::b6_minimal();
        let out = registry().clamp(FieldPath::BoreMm, &PatchValue::from("wide"), &spec);
        assert_eq!(out, ClampOutcome::unchanged(&PatchValue::from("wide")));

        let out = registry().clamp(FieldPath::Header, &PatchValue::from("UEL"), &spec);
        assert_eq!(out.note, None);
    }

    #[test]
    fn gated_enumeration_is_reported_disabled() {
        let reg = ConstraintRegistry::empty().with_template(
            FieldPath::Header,
            ConstraintTemplate::step(0.0).enabled_when(EnabledWhen::DualRunner),
        );
        let mut spec = presets::b6_minimal();
        spec.runner_length_short_mm = None;

        let out = reg.clamp(FieldPath::Header, &PatchValue::from("UEL"), &spec);
        assert!(out.is_disabled());
        assert_eq!(out.value, PatchValue::from("UEL"));

        spec.runner_length_short_mm = Some(200.0);
        let out = reg.clamp(FieldPath::Header, &PatchValue::from("UEL"), &spec);
        assert_eq!(out, ClampOutcome::unchanged(&PatchValue::from("UEL")));
    }

    #[test]
    fn custom_registry_rules() {
        let reg = ConstraintRegistry::empty()
            .with_template(FieldPath::SoftTaperRpm, ConstraintTemplate::step(0.0))
            .with_rule(
                FieldPath::SoftTaperRpm,
                DynamicRule::MinFollows(FieldPath::Cylinders),
            );
        let spec = presets::b6_minimal();
        let c = reg.effective(FieldPath::SoftTaperRpm, &spec);
        assert_eq!(c.min, Some(4.0));
        assert_eq!(c.max, None);
    }
}
