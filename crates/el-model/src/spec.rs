//! Engine configuration snapshot.
//!
//! Units are carried in field names: `_mm`, `_cc`, `_deg`, `_kpa`, `_k`,
//! `_rpm`. Sparse tables keyed by rpm use `BTreeMap<u32, _>` so iteration is
//! always rpm-ordered; tables keyed by an angle are kept as sorted point lists.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::{Architecture, CompressionBehavior, FuelType, HeaderLayout, InjectionType};

/// One complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSpec {
    pub name: String,
    #[serde(default)]
    pub layout: Architecture,

    // Core geometry
    pub cylinders: u32,
    pub bore_mm: f64,
    pub stroke_mm: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rod_length_mm: Option<f64>,

    // Either a direct compression ratio or enough chamber geometry to derive one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chamber_volume_cc: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub piston_dish_volume_cc: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deck_clearance_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_gasket_thickness_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_gasket_bore_mm: Option<f64>,

    // Cylinder head / ports
    pub valves_per_cylinder: u32,
    pub intake_valve_diameter_mm: f64,
    pub exhaust_valve_diameter_mm: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intake_port_diameter_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exhaust_port_diameter_mm: Option<f64>,

    pub cam: CamshaftSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vvt: Option<VvtSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vvl: Option<VvlSpec>,

    // Induction
    pub plenum_volume_cc: f64,
    pub runner_length_mm: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runner_length_short_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runner_switch_to_short_rpm: Option<u32>,
    pub throttle_diameter_mm: f64,
    /// Measured throttle effective area by blade angle, sorted by angle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throttle_area_map: Option<Vec<ThrottleAreaPoint>>,

    // Exhaust
    #[serde(default)]
    pub header: HeaderLayout,
    pub primary_length1_mm: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_length2_mm: Option<f64>,
    pub primary_id_mm: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collector_id_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cat_backpressure_kpa: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exhaust_backpressure_kpa_by_rpm: Option<BTreeMap<u32, f64>>,

    // Fuel & mixture
    #[serde(default)]
    pub injection: InjectionType,
    #[serde(default)]
    pub fuel: FuelType,
    pub afr_stoich: f64,
    pub fuel_lhv_mj_per_kg: f64,
    pub wot_lambda: f64,
    #[serde(default = "default_injectors_per_cylinder")]
    pub injectors_per_cylinder: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub injector_flow_cc_per_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_pressure_bar: Option<f64>,
    #[serde(default = "default_injector_duty_limit")]
    pub injector_duty_limit: f64,

    // Combustion, knock, spark, heat transfer
    #[serde(default)]
    pub wiebe: WiebeModel,
    #[serde(default)]
    pub knock: KnockModel,
    #[serde(default)]
    pub spark: SparkStrategy,
    #[serde(default)]
    pub heat_transfer: HeatTransferModel,

    pub friction: FrictionModel,

    // Environment
    pub ambient_pressure_kpa: f64,
    pub ambient_temp_k: f64,
    pub intake_air_temp_k: f64,
    #[serde(default = "default_exhaust_pressure_kpa")]
    pub exhaust_pressure_kpa: f64,

    // Limits
    pub redline_rpm: u32,
    pub rev_limit_rpm: u32,
    #[serde(default = "default_soft_taper_rpm")]
    pub soft_taper_rpm: u32,

    // Measured data hooks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_flow_intake_cfm28: Option<Vec<FlowPoint28>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_flow_exhaust_cfm28: Option<Vec<FlowPoint28>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intake_lift_curve: Option<Vec<LiftPoint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exhaust_lift_curve: Option<Vec<LiftPoint>>,
    #[serde(default)]
    pub resonance: ResonanceTuning,

    #[serde(default)]
    pub toggles: SolverToggles,
}

fn default_injectors_per_cylinder() -> u32 {
    1
}

fn default_injector_duty_limit() -> f64 {
    0.85
}

fn default_exhaust_pressure_kpa() -> f64 {
    101.325
}

fn default_soft_taper_rpm() -> u32 {
    400
}

impl Default for EngineSpec {
    fn default() -> Self {
        Self {
            name: "Unnamed".to_string(),
            layout: Architecture::default(),
            cylinders: 0,
            bore_mm: 0.0,
            stroke_mm: 0.0,
            rod_length_mm: None,
            compression_ratio: None,
            chamber_volume_cc: None,
            piston_dish_volume_cc: None,
            deck_clearance_mm: None,
            head_gasket_thickness_mm: None,
            head_gasket_bore_mm: None,
            valves_per_cylinder: 0,
            intake_valve_diameter_mm: 0.0,
            exhaust_valve_diameter_mm: 0.0,
            intake_port_diameter_mm: None,
            exhaust_port_diameter_mm: None,
            cam: CamshaftSpec::default(),
            vvt: None,
            vvl: None,
            plenum_volume_cc: 0.0,
            runner_length_mm: 0.0,
            runner_length_short_mm: None,
            runner_switch_to_short_rpm: None,
            throttle_diameter_mm: 0.0,
            throttle_area_map: None,
            header: HeaderLayout::default(),
            primary_length1_mm: 0.0,
            primary_length2_mm: None,
            primary_id_mm: 0.0,
            collector_id_mm: None,
            cat_backpressure_kpa: None,
            exhaust_backpressure_kpa_by_rpm: None,
            injection: InjectionType::default(),
            fuel: FuelType::default(),
            afr_stoich: 14.7,
            fuel_lhv_mj_per_kg: 43.0,
            wot_lambda: 0.88,
            injectors_per_cylinder: default_injectors_per_cylinder(),
            injector_flow_cc_per_min: None,
            fuel_pressure_bar: None,
            injector_duty_limit: default_injector_duty_limit(),
            wiebe: WiebeModel::default(),
            knock: KnockModel::default(),
            spark: SparkStrategy::default(),
            heat_transfer: HeatTransferModel::default(),
            friction: FrictionModel::default(),
            ambient_pressure_kpa: 101.325,
            ambient_temp_k: 298.15,
            intake_air_temp_k: 298.15,
            exhaust_pressure_kpa: default_exhaust_pressure_kpa(),
            redline_rpm: 0,
            rev_limit_rpm: 0,
            soft_taper_rpm: default_soft_taper_rpm(),
            head_flow_intake_cfm28: None,
            head_flow_exhaust_cfm28: None,
            intake_lift_curve: None,
            exhaust_lift_curve: None,
            resonance: ResonanceTuning::default(),
            toggles: SolverToggles::default(),
        }
    }
}

/// Minimal cam card. Installed centerlines are optional; without them events
/// are placed from the lobe separation angle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CamshaftSpec {
    pub intake_max_lift_mm: f64,
    pub exhaust_max_lift_mm: f64,
    pub intake_duration_deg050: f64,
    pub exhaust_duration_deg050: f64,
    pub lobe_separation_angle_deg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intake_centerline_deg_atdc: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exhaust_centerline_deg_btdc: Option<f64>,
}

/// Cam phaser position, intake advance and exhaust retard in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CamPhasing {
    pub intake: f64,
    pub exhaust: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VvtSpec {
    pub intake_advance_range_deg: f64,
    pub exhaust_retard_range_deg: f64,
    #[serde(default)]
    pub rpm_schedule: BTreeMap<u32, CamPhasing>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VvlSpec {
    pub low_lift: CamshaftSpec,
    pub high_lift: CamshaftSpec,
    pub switch_on_rpm: u32,
    pub switch_off_rpm: u32,
}

/// Wiebe burn law: fixed duration or a bore/piston-speed correlation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WiebeModel {
    pub a: f64,
    pub m: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burn_duration_deg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k0: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k1_bore: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k2_piston_speed: Option<f64>,
}

impl Default for WiebeModel {
    fn default() -> Self {
        Self {
            a: 5.0,
            m: 2.0,
            burn_duration_deg: None,
            k0: None,
            k1_bore: None,
            k2_piston_speed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnockModel {
    pub octane_ron: f64,
    pub safety_margin_deg: f64,
    pub enable_knock_cap: bool,
}

impl Default for KnockModel {
    fn default() -> Self {
        Self {
            octane_ron: 98.0,
            safety_margin_deg: 2.0,
            enable_knock_cap: true,
        }
    }
}

/// MBT search window around an optional rpm-keyed base spark table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparkStrategy {
    pub search_window_minus_deg: f64,
    pub search_window_plus_deg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_spark_deg_btdc_by_rpm: Option<BTreeMap<u32, f64>>,
}

impl Default for SparkStrategy {
    fn default() -> Self {
        Self {
            search_window_minus_deg: 10.0,
            search_window_plus_deg: 20.0,
            base_spark_deg_btdc_by_rpm: None,
        }
    }
}

/// Woschni-style heat transfer constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatTransferModel {
    pub c1: f64,
    pub c2: f64,
    pub c3: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_head_m2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_cylinder_m2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_piston_m2: Option<f64>,
    pub coolant_temp_k: f64,
}

impl Default for HeatTransferModel {
    fn default() -> Self {
        Self {
            c1: 2.28,
            c2: 0.00324,
            c3: 0.0,
            area_head_m2: None,
            area_cylinder_m2: None,
            area_piston_m2: None,
            coolant_temp_k: 363.15,
        }
    }
}

/// FMEP = A + B*Up + C*Up^2 in kPa, Up in m/s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrictionModel {
    pub a_kpa: f64,
    pub b_kpa_per_mps: f64,
    pub c_kpa_per_mps2: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessory_torque_nm_by_rpm: Option<BTreeMap<u32, f64>>,
}

impl Default for FrictionModel {
    fn default() -> Self {
        Self {
            a_kpa: 80.0,
            b_kpa_per_mps: 6.0,
            c_kpa_per_mps2: 0.25,
            accessory_torque_nm_by_rpm: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResonanceTuning {
    pub intake_bump_gain: f64,
    pub exhaust_bump_gain: f64,
    pub exhaust_dip_gain: f64,
    pub feature_width_rpm: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helmholtz_tuning_coeff: Option<f64>,
}

impl Default for ResonanceTuning {
    fn default() -> Self {
        Self {
            intake_bump_gain: 0.03,
            exhaust_bump_gain: 0.03,
            exhaust_dip_gain: 0.08,
            feature_width_rpm: 450.0,
            helmholtz_tuning_coeff: None,
        }
    }
}

/// Head flow bench point at 28 inH2O.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowPoint28 {
    pub lift_mm: f64,
    pub cfm28: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiftPoint {
    pub crank_deg: f64,
    pub lift_mm: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThrottleAreaPoint {
    pub angle_deg: f64,
    pub effective_area_m2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverToggles {
    pub use_head_flow_points_when_available: bool,
    pub enable_resonance_model: bool,
    pub enable_heat_transfer: bool,
    pub enable_knock_limit: bool,
    pub enable_injector_capacity_limit: bool,
    pub compression_behavior: CompressionBehavior,
}

impl Default for SolverToggles {
    fn default() -> Self {
        Self {
            use_head_flow_points_when_available: true,
            enable_resonance_model: true,
            enable_heat_transfer: true,
            enable_knock_limit: true,
            enable_injector_capacity_limit: true,
            compression_behavior: CompressionBehavior::GeometryDefinesCr,
        }
    }
}

impl EngineSpec {
    /// True when the compression ratio must be recomputed from chamber geometry.
    pub fn geometry_defines_cr(&self) -> bool {
        self.toggles.compression_behavior == CompressionBehavior::GeometryDefinesCr
            && (self.chamber_volume_cc.is_some() || self.head_gasket_thickness_mm.is_some())
    }
}
