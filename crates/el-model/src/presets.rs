//! Ready-made engine descriptions.

use crate::{
    Architecture, CamshaftSpec, EngineSpec, FrictionModel, FuelType, HeaderLayout, InjectionType,
};

/// 1.6 L four-valve inline four with a direct compression ratio and no
/// chamber geometry. Small enough to reason about by hand.
pub fn b6_minimal() -> EngineSpec {
    EngineSpec {
        name: "B6-ZE (minimal)".to_string(),
        layout: Architecture::I4,
        cylinders: 4,
        bore_mm: 78.0,
        stroke_mm: 83.6,
        compression_ratio: Some(9.4),
        valves_per_cylinder: 4,
        intake_valve_diameter_mm: 31.0,
        exhaust_valve_diameter_mm: 26.0,
        cam: CamshaftSpec {
            intake_max_lift_mm: 9.0,
            exhaust_max_lift_mm: 9.0,
            intake_duration_deg050: 230.0,
            exhaust_duration_deg050: 224.0,
            lobe_separation_angle_deg: 110.0,
            ..CamshaftSpec::default()
        },
        plenum_volume_cc: 2000.0,
        runner_length_mm: 320.0,
        throttle_diameter_mm: 55.0,
        header: HeaderLayout::FourTwoOne,
        primary_length1_mm: 420.0,
        primary_id_mm: 36.0,
        injection: InjectionType::Port,
        fuel: FuelType::PumpRegular,
        afr_stoich: 14.7,
        fuel_lhv_mj_per_kg: 43.0,
        wot_lambda: 0.88,
        friction: FrictionModel {
            a_kpa: 80.0,
            b_kpa_per_mps: 6.0,
            c_kpa_per_mps2: 0.25,
            accessory_torque_nm_by_rpm: None,
        },
        ambient_pressure_kpa: 101.325,
        ambient_temp_k: 298.15,
        intake_air_temp_k: 298.15,
        redline_rpm: 7200,
        rev_limit_rpm: 7300,
        ..EngineSpec::default()
    }
}

/// [`b6_minimal`] with chamber geometry filled in, so the compression ratio
/// is derived rather than given. The ratio is left unset until the geometry
/// is resolved.
pub fn b6_with_chamber() -> EngineSpec {
    EngineSpec {
        name: "B6-ZE (chamber geometry)".to_string(),
        compression_ratio: None,
        chamber_volume_cc: Some(40.0),
        piston_dish_volume_cc: Some(0.0),
        deck_clearance_mm: Some(0.0),
        head_gasket_thickness_mm: Some(1.0),
        head_gasket_bore_mm: None,
        ..b6_minimal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_hold_required_fields() {
        for spec in [b6_minimal(), b6_with_chamber()] {
            assert!(spec.cylinders > 0);
            assert!(spec.bore_mm > 0.0 && spec.stroke_mm > 0.0);
            assert!(spec.rev_limit_rpm >= spec.redline_rpm);
        }
    }

    #[test]
    fn chamber_preset_switches_cr_policy_on() {
        assert!(!b6_minimal().geometry_defines_cr());
        assert!(b6_with_chamber().geometry_defines_cr());
        assert_eq!(b6_with_chamber().compression_ratio, None);
    }
}
