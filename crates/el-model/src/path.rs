//! The closed set of writable leaves and their dotted paths.
//!
//! Every editable scalar of [`EngineSpec`] has exactly one [`FieldPath`]
//! variant. Dotted text such as `Cam.IntakeDuration_deg050` is only accepted
//! at the boundary and resolved to a variant; everything past that point
//! matches on the enum, so an unknown leaf cannot reach the writer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::enums::NamedVariant;
use crate::{
    Architecture, CompressionBehavior, EngineSpec, FuelType, HeaderLayout, InjectionType,
    ModelError, PatchValue,
};

/// Declared type of a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    Float,
    OptionalFloat,
    Int,
    OptionalInt,
    /// Named enumeration; the payload is the enumeration label.
    Enum(&'static str),
}

impl LeafKind {
    pub fn is_optional(self) -> bool {
        matches!(self, Self::OptionalFloat | Self::OptionalInt)
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, Self::Enum(_))
    }

    /// Short description used in conversion errors.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::OptionalFloat => "float or null",
            Self::Int => "non-negative integer",
            Self::OptionalInt => "non-negative integer or null",
            Self::Enum(kind) => kind,
        }
    }
}

/// A writable leaf of the engine snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldPath {
    // geometry
    Layout,
    Cylinders,
    BoreMm,
    StrokeMm,
    RodLengthMm,
    CompressionRatio,
    ChamberVolumeCc,
    PistonDishVolumeCc,
    DeckClearanceMm,
    HeadGasketThicknessMm,
    HeadGasketBoreMm,
    CompressionBehavior,
    // head
    IntakeValveDiameterMm,
    ExhaustValveDiameterMm,
    // valvetrain
    CamIntakeDurationDeg050,
    CamExhaustDurationDeg050,
    CamIntakeMaxLiftMm,
    CamExhaustMaxLiftMm,
    CamLobeSeparationDeg,
    CamIntakeCenterlineDegAtdc,
    CamExhaustCenterlineDegBtdc,
    // induction
    PlenumVolumeCc,
    RunnerLengthMm,
    RunnerLengthShortMm,
    RunnerSwitchToShortRpm,
    ThrottleDiameterMm,
    // exhaust
    Header,
    PrimaryLength1Mm,
    PrimaryLength2Mm,
    PrimaryIdMm,
    CollectorIdMm,
    CatBackpressureKpa,
    // fuel
    Injection,
    Fuel,
    AfrStoich,
    WotLambda,
    InjectorFlowCcPerMin,
    FuelPressureBar,
    KnockOctaneRon,
    // friction
    FrictionAKpa,
    FrictionBKpaPerMps,
    FrictionCKpaPerMps2,
    // environment
    AmbientPressureKpa,
    AmbientTempK,
    IntakeAirTempK,
    // limits
    RedlineRpm,
    RevLimitRpm,
    SoftTaperRpm,
}

impl FieldPath {
    /// Every writable leaf, in display order.
    pub const ALL: &'static [FieldPath] = &[
        Self::Layout,
        Self::Cylinders,
        Self::BoreMm,
        Self::StrokeMm,
        Self::RodLengthMm,
        Self::CompressionRatio,
        Self::ChamberVolumeCc,
        Self::PistonDishVolumeCc,
        Self::DeckClearanceMm,
        Self::HeadGasketThicknessMm,
        Self::HeadGasketBoreMm,
        Self::CompressionBehavior,
        Self::IntakeValveDiameterMm,
        Self::ExhaustValveDiameterMm,
        Self::CamIntakeDurationDeg050,
        Self::CamExhaustDurationDeg050,
        Self::CamIntakeMaxLiftMm,
        Self::CamExhaustMaxLiftMm,
        Self::CamLobeSeparationDeg,
        Self::CamIntakeCenterlineDegAtdc,
        Self::CamExhaustCenterlineDegBtdc,
        Self::PlenumVolumeCc,
        Self::RunnerLengthMm,
        Self::RunnerLengthShortMm,
        Self::RunnerSwitchToShortRpm,
        Self::ThrottleDiameterMm,
        Self::Header,
        Self::PrimaryLength1Mm,
        Self::PrimaryLength2Mm,
        Self::PrimaryIdMm,
        Self::CollectorIdMm,
        Self::CatBackpressureKpa,
        Self::Injection,
        Self::Fuel,
        Self::AfrStoich,
        Self::WotLambda,
        Self::InjectorFlowCcPerMin,
        Self::FuelPressureBar,
        Self::KnockOctaneRon,
        Self::FrictionAKpa,
        Self::FrictionBKpaPerMps,
        Self::FrictionCKpaPerMps2,
        Self::AmbientPressureKpa,
        Self::AmbientTempK,
        Self::IntakeAirTempK,
        Self::RedlineRpm,
        Self::RevLimitRpm,
        Self::SoftTaperRpm,
    ];

    /// Dotted path as written by editors.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Layout => "Layout",
            Self::Cylinders => "Cylinders",
            Self::BoreMm => "Bore_mm",
            Self::StrokeMm => "Stroke_mm",
            Self::RodLengthMm => "RodLength_mm",
            Self::CompressionRatio => "CompressionRatio",
            Self::ChamberVolumeCc => "ChamberVolume_cc",
            Self::PistonDishVolumeCc => "PistonDishVolume_cc",
            Self::DeckClearanceMm => "DeckClearance_mm",
            Self::HeadGasketThicknessMm => "HeadGasketThickness_mm",
            Self::HeadGasketBoreMm => "HeadGasketBore_mm",
            Self::CompressionBehavior => "Toggles.CompressionBehavior",
            Self::IntakeValveDiameterMm => "IntakeValveDiameter_mm",
            Self::ExhaustValveDiameterMm => "ExhaustValveDiameter_mm",
            Self::CamIntakeDurationDeg050 => "Cam.IntakeDuration_deg050",
            Self::CamExhaustDurationDeg050 => "Cam.ExhaustDuration_deg050",
            Self::CamIntakeMaxLiftMm => "Cam.IntakeMaxLift_mm",
            Self::CamExhaustMaxLiftMm => "Cam.ExhaustMaxLift_mm",
            Self::CamLobeSeparationDeg => "Cam.LobeSeparationAngle_deg",
            Self::CamIntakeCenterlineDegAtdc => "Cam.IntakeCenterline_degATDC",
            Self::CamExhaustCenterlineDegBtdc => "Cam.ExhaustCenterline_degBTDC",
            Self::PlenumVolumeCc => "PlenumVolume_cc",
            Self::RunnerLengthMm => "RunnerLength_mm",
            Self::RunnerLengthShortMm => "RunnerLengthShort_mm",
            Self::RunnerSwitchToShortRpm => "RunnerSwitchToShort_RPM",
            Self::ThrottleDiameterMm => "ThrottleDiameter_mm",
            Self::Header => "Header",
            Self::PrimaryLength1Mm => "PrimaryLength1_mm",
            Self::PrimaryLength2Mm => "PrimaryLength2_mm",
            Self::PrimaryIdMm => "PrimaryID_mm",
            Self::CollectorIdMm => "CollectorID_mm",
            Self::CatBackpressureKpa => "CatBackpressure_kPa",
            Self::Injection => "Injection",
            Self::Fuel => "Fuel",
            Self::AfrStoich => "AFR_Stoich",
            Self::WotLambda => "WOT_Lambda",
            Self::InjectorFlowCcPerMin => "InjectorFlow_cc_per_min",
            Self::FuelPressureBar => "FuelPressure_bar",
            Self::KnockOctaneRon => "Knock.Octane_RON",
            Self::FrictionAKpa => "Friction.A_kPa",
            Self::FrictionBKpaPerMps => "Friction.B_kPa_per_mps",
            Self::FrictionCKpaPerMps2 => "Friction.C_kPa_per_mps2",
            Self::AmbientPressureKpa => "AmbientPressure_kPa",
            Self::AmbientTempK => "AmbientTemp_K",
            Self::IntakeAirTempK => "IntakeAirTemp_K",
            Self::RedlineRpm => "Redline_RPM",
            Self::RevLimitRpm => "RevLimit_RPM",
            Self::SoftTaperRpm => "SoftTaper_RPM",
        }
    }

    pub fn kind(self) -> LeafKind {
        use LeafKind::*;
        match self {
            Self::Layout => Enum(Architecture::KIND),
            Self::CompressionBehavior => Enum(CompressionBehavior::KIND),
            Self::Header => Enum(HeaderLayout::KIND),
            Self::Injection => Enum(InjectionType::KIND),
            Self::Fuel => Enum(FuelType::KIND),

            Self::Cylinders | Self::RedlineRpm | Self::RevLimitRpm | Self::SoftTaperRpm => Int,
            Self::RunnerSwitchToShortRpm => OptionalInt,

            Self::RodLengthMm
            | Self::CompressionRatio
            | Self::ChamberVolumeCc
            | Self::PistonDishVolumeCc
            | Self::DeckClearanceMm
            | Self::HeadGasketThicknessMm
            | Self::HeadGasketBoreMm
            | Self::CamIntakeCenterlineDegAtdc
            | Self::CamExhaustCenterlineDegBtdc
            | Self::RunnerLengthShortMm
            | Self::PrimaryLength2Mm
            | Self::CollectorIdMm
            | Self::CatBackpressureKpa
            | Self::InjectorFlowCcPerMin
            | Self::FuelPressureBar => OptionalFloat,

            Self::BoreMm
            | Self::StrokeMm
            | Self::IntakeValveDiameterMm
            | Self::ExhaustValveDiameterMm
            | Self::CamIntakeDurationDeg050
            | Self::CamExhaustDurationDeg050
            | Self::CamIntakeMaxLiftMm
            | Self::CamExhaustMaxLiftMm
            | Self::CamLobeSeparationDeg
            | Self::PlenumVolumeCc
            | Self::RunnerLengthMm
            | Self::ThrottleDiameterMm
            | Self::PrimaryLength1Mm
            | Self::PrimaryIdMm
            | Self::AfrStoich
            | Self::WotLambda
            | Self::KnockOctaneRon
            | Self::FrictionAKpa
            | Self::FrictionBKpaPerMps
            | Self::FrictionCKpaPerMps2
            | Self::AmbientPressureKpa
            | Self::AmbientTempK
            | Self::IntakeAirTempK => Float,
        }
    }

    /// Accepted names for enumeration leaves.
    pub fn enum_names(self) -> Option<Vec<&'static str>> {
        match self {
            Self::Layout => Some(Architecture::names()),
            Self::CompressionBehavior => Some(CompressionBehavior::names()),
            Self::Header => Some(HeaderLayout::names()),
            Self::Injection => Some(InjectionType::names()),
            Self::Fuel => Some(FuelType::names()),
            _ => None,
        }
    }

    /// Section of the snapshot the leaf belongs to.
    pub fn group(self) -> &'static str {
        match self {
            Self::Layout
            | Self::Cylinders
            | Self::BoreMm
            | Self::StrokeMm
            | Self::RodLengthMm
            | Self::CompressionRatio
            | Self::ChamberVolumeCc
            | Self::PistonDishVolumeCc
            | Self::DeckClearanceMm
            | Self::HeadGasketThicknessMm
            | Self::HeadGasketBoreMm
            | Self::CompressionBehavior => "geometry",
            Self::IntakeValveDiameterMm | Self::ExhaustValveDiameterMm => "head",
            Self::CamIntakeDurationDeg050
            | Self::CamExhaustDurationDeg050
            | Self::CamIntakeMaxLiftMm
            | Self::CamExhaustMaxLiftMm
            | Self::CamLobeSeparationDeg
            | Self::CamIntakeCenterlineDegAtdc
            | Self::CamExhaustCenterlineDegBtdc => "valvetrain",
            Self::PlenumVolumeCc
            | Self::RunnerLengthMm
            | Self::RunnerLengthShortMm
            | Self::RunnerSwitchToShortRpm
            | Self::ThrottleDiameterMm => "induction",
            Self::Header
            | Self::PrimaryLength1Mm
            | Self::PrimaryLength2Mm
            | Self::PrimaryIdMm
            | Self::CollectorIdMm
            | Self::CatBackpressureKpa => "exhaust",
            Self::Injection
            | Self::Fuel
            | Self::AfrStoich
            | Self::WotLambda
            | Self::InjectorFlowCcPerMin
            | Self::FuelPressureBar
            | Self::KnockOctaneRon => "fuel",
            Self::FrictionAKpa | Self::FrictionBKpaPerMps | Self::FrictionCKpaPerMps2 => {
                "friction"
            }
            Self::AmbientPressureKpa | Self::AmbientTempK | Self::IntakeAirTempK => "environment",
            Self::RedlineRpm | Self::RevLimitRpm | Self::SoftTaperRpm => "limits",
        }
    }

    /// Current value of this leaf in `spec`.
    pub fn read(self, spec: &EngineSpec) -> PatchValue {
        match self {
            Self::Layout => spec.layout.name().into(),
            Self::Cylinders => spec.cylinders.into(),
            Self::BoreMm => spec.bore_mm.into(),
            Self::StrokeMm => spec.stroke_mm.into(),
            Self::RodLengthMm => spec.rod_length_mm.into(),
            Self::CompressionRatio => spec.compression_ratio.into(),
            Self::ChamberVolumeCc => spec.chamber_volume_cc.into(),
            Self::PistonDishVolumeCc => spec.piston_dish_volume_cc.into(),
            Self::DeckClearanceMm => spec.deck_clearance_mm.into(),
            Self::HeadGasketThicknessMm => spec.head_gasket_thickness_mm.into(),
            Self::HeadGasketBoreMm => spec.head_gasket_bore_mm.into(),
            Self::CompressionBehavior => spec.toggles.compression_behavior.name().into(),
            Self::IntakeValveDiameterMm => spec.intake_valve_diameter_mm.into(),
            Self::ExhaustValveDiameterMm => spec.exhaust_valve_diameter_mm.into(),
            Self::CamIntakeDurationDeg050 => spec.cam.intake_duration_deg050.into(),
            Self::CamExhaustDurationDeg050 => spec.cam.exhaust_duration_deg050.into(),
            Self::CamIntakeMaxLiftMm => spec.cam.intake_max_lift_mm.into(),
            Self::CamExhaustMaxLiftMm => spec.cam.exhaust_max_lift_mm.into(),
            Self::CamLobeSeparationDeg => spec.cam.lobe_separation_angle_deg.into(),
            Self::CamIntakeCenterlineDegAtdc => spec.cam.intake_centerline_deg_atdc.into(),
            Self::CamExhaustCenterlineDegBtdc => spec.cam.exhaust_centerline_deg_btdc.into(),
            Self::PlenumVolumeCc => spec.plenum_volume_cc.into(),
            Self::RunnerLengthMm => spec.runner_length_mm.into(),
            Self::RunnerLengthShortMm => spec.runner_length_short_mm.into(),
            Self::RunnerSwitchToShortRpm => spec.runner_switch_to_short_rpm.into(),
            Self::ThrottleDiameterMm => spec.throttle_diameter_mm.into(),
            Self::Header => spec.header.name().into(),
            Self::PrimaryLength1Mm => spec.primary_length1_mm.into(),
            Self::PrimaryLength2Mm => spec.primary_length2_mm.into(),
            Self::PrimaryIdMm => spec.primary_id_mm.into(),
            Self::CollectorIdMm => spec.collector_id_mm.into(),
            Self::CatBackpressureKpa => spec.cat_backpressure_kpa.into(),
            Self::Injection => spec.injection.name().into(),
            Self::Fuel => spec.fuel.name().into(),
            Self::AfrStoich => spec.afr_stoich.into(),
            Self::WotLambda => spec.wot_lambda.into(),
            Self::InjectorFlowCcPerMin => spec.injector_flow_cc_per_min.into(),
            Self::FuelPressureBar => spec.fuel_pressure_bar.into(),
            Self::KnockOctaneRon => spec.knock.octane_ron.into(),
            Self::FrictionAKpa => spec.friction.a_kpa.into(),
            Self::FrictionBKpaPerMps => spec.friction.b_kpa_per_mps.into(),
            Self::FrictionCKpaPerMps2 => spec.friction.c_kpa_per_mps2.into(),
            Self::AmbientPressureKpa => spec.ambient_pressure_kpa.into(),
            Self::AmbientTempK => spec.ambient_temp_k.into(),
            Self::IntakeAirTempK => spec.intake_air_temp_k.into(),
            Self::RedlineRpm => spec.redline_rpm.into(),
            Self::RevLimitRpm => spec.rev_limit_rpm.into(),
            Self::SoftTaperRpm => spec.soft_taper_rpm.into(),
        }
    }
}

impl FromStr for FieldPath {
    type Err = ModelError;

    /// Case-insensitive lookup of a dotted path.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ModelError::UnknownPath {
                path: wanted.to_string(),
            })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// One leaf that differs between two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub path: FieldPath,
    pub before: PatchValue,
    pub after: PatchValue,
}

/// Writable leaves whose values differ between `before` and `after`.
pub fn diff(before: &EngineSpec, after: &EngineSpec) -> Vec<FieldChange> {
    FieldPath::ALL
        .iter()
        .filter_map(|&path| {
            let a = path.read(before);
            let b = path.read(after);
            (a != b).then_some(FieldChange {
                path,
                before: a,
                after: b,
            })
        })
        .collect()
}
