//! Patch applier: writes an ordered batch of edits into a new snapshot.
//!
//! The source snapshot is never touched. Edits are written into a clone in
//! order, so a later edit to the same leaf wins; the first failure drops the
//! clone and the caller keeps the unmodified source.

use el_core::ensure_finite;
use el_model::{
    Architecture, CompressionBehavior, EngineSpec, FieldPath, FuelType, HeaderLayout,
    InjectionType, NamedVariant, PatchValue,
};

use crate::{EditError, EditResult, FieldEdit, Patch};

/// Apply a raw patch. Unknown paths and unconvertible values abort the batch.
pub fn apply(spec: &EngineSpec, patch: &Patch) -> EditResult<EngineSpec> {
    let edits = patch.resolve()?;
    apply_edits(spec, &edits)
}

/// Apply edits whose paths are already resolved.
pub fn apply_edits(spec: &EngineSpec, edits: &[FieldEdit]) -> EditResult<EngineSpec> {
    let mut dst = spec.clone();
    for edit in edits {
        write_leaf(&mut dst, edit.path, &edit.value)?;
    }
    Ok(dst)
}

fn write_leaf(dst: &mut EngineSpec, path: FieldPath, value: &PatchValue) -> EditResult<()> {
    use FieldPath as P;
    match path {
        // geometry
        P::Layout => dst.layout = to_enum::<Architecture>(path, value)?,
        P::Cylinders => dst.cylinders = to_u32(path, value)?,
        P::BoreMm => dst.bore_mm = to_f64(path, value)?,
        P::StrokeMm => dst.stroke_mm = to_f64(path, value)?,
        P::RodLengthMm => dst.rod_length_mm = to_opt_f64(path, value)?,

        // compression
        P::CompressionRatio => dst.compression_ratio = to_opt_f64(path, value)?,
        P::ChamberVolumeCc => dst.chamber_volume_cc = to_opt_f64(path, value)?,
        P::PistonDishVolumeCc => dst.piston_dish_volume_cc = to_opt_f64(path, value)?,
        P::DeckClearanceMm => dst.deck_clearance_mm = to_opt_f64(path, value)?,
        P::HeadGasketThicknessMm => dst.head_gasket_thickness_mm = to_opt_f64(path, value)?,
        P::HeadGasketBoreMm => dst.head_gasket_bore_mm = to_opt_f64(path, value)?,
        P::CompressionBehavior => {
            dst.toggles.compression_behavior = to_enum::<CompressionBehavior>(path, value)?
        }

        // head
        P::IntakeValveDiameterMm => dst.intake_valve_diameter_mm = to_f64(path, value)?,
        P::ExhaustValveDiameterMm => dst.exhaust_valve_diameter_mm = to_f64(path, value)?,

        // valvetrain
        P::CamIntakeDurationDeg050 => dst.cam.intake_duration_deg050 = to_f64(path, value)?,
        P::CamExhaustDurationDeg050 => dst.cam.exhaust_duration_deg050 = to_f64(path, value)?,
        P::CamIntakeMaxLiftMm => dst.cam.intake_max_lift_mm = to_f64(path, value)?,
        P::CamExhaustMaxLiftMm => dst.cam.exhaust_max_lift_mm = to_f64(path, value)?,
        P::CamLobeSeparationDeg => dst.cam.lobe_separation_angle_deg = to_f64(path, value)?,
        P::CamIntakeCenterlineDegAtdc => {
            dst.cam.intake_centerline_deg_atdc = to_opt_f64(path, value)?
        }
        P::CamExhaustCenterlineDegBtdc => {
            dst.cam.exhaust_centerline_deg_btdc = to_opt_f64(path, value)?
        }

        // induction
        P::PlenumVolumeCc => dst.plenum_volume_cc = to_f64(path, value)?,
        P::RunnerLengthMm => dst.runner_length_mm = to_f64(path, value)?,
        P::RunnerLengthShortMm => dst.runner_length_short_mm = to_opt_f64(path, value)?,
        P::RunnerSwitchToShortRpm => dst.runner_switch_to_short_rpm = to_opt_u32(path, value)?,
        P::ThrottleDiameterMm => dst.throttle_diameter_mm = to_f64(path, value)?,

        // exhaust
        P::Header => dst.header = to_enum::<HeaderLayout>(path, value)?,
        P::PrimaryLength1Mm => dst.primary_length1_mm = to_f64(path, value)?,
        P::PrimaryLength2Mm => dst.primary_length2_mm = to_opt_f64(path, value)?,
        P::PrimaryIdMm => dst.primary_id_mm = to_f64(path, value)?,
        P::CollectorIdMm => dst.collector_id_mm = to_opt_f64(path, value)?,
        P::CatBackpressureKpa => dst.cat_backpressure_kpa = to_opt_f64(path, value)?,

        // fuel
        P::Injection => dst.injection = to_enum::<InjectionType>(path, value)?,
        P::Fuel => dst.fuel = to_enum::<FuelType>(path, value)?,
        P::AfrStoich => dst.afr_stoich = to_f64(path, value)?,
        P::WotLambda => dst.wot_lambda = to_f64(path, value)?,
        P::InjectorFlowCcPerMin => dst.injector_flow_cc_per_min = to_opt_f64(path, value)?,
        P::FuelPressureBar => dst.fuel_pressure_bar = to_opt_f64(path, value)?,
        P::KnockOctaneRon => dst.knock.octane_ron = to_f64(path, value)?,

        // friction
        P::FrictionAKpa => dst.friction.a_kpa = to_f64(path, value)?,
        P::FrictionBKpaPerMps => dst.friction.b_kpa_per_mps = to_f64(path, value)?,
        P::FrictionCKpaPerMps2 => dst.friction.c_kpa_per_mps2 = to_f64(path, value)?,

        // environment
        P::AmbientPressureKpa => dst.ambient_pressure_kpa = to_f64(path, value)?,
        P::AmbientTempK => dst.ambient_temp_k = to_f64(path, value)?,
        P::IntakeAirTempK => dst.intake_air_temp_k = to_f64(path, value)?,

        // limits
        P::RedlineRpm => dst.redline_rpm = to_u32(path, value)?,
        P::RevLimitRpm => dst.rev_limit_rpm = to_u32(path, value)?,
        P::SoftTaperRpm => dst.soft_taper_rpm = to_u32(path, value)?,
    }
    Ok(())
}

fn conversion_error(path: FieldPath, expected: impl Into<String>, found: &PatchValue) -> EditError {
    EditError::Conversion {
        path: path.as_str().to_string(),
        expected: expected.into(),
        found: found.to_string(),
    }
}

fn to_f64(path: FieldPath, value: &PatchValue) -> EditResult<f64> {
    value
        .as_f64()
        .and_then(|v| ensure_finite(v, "patch value").ok())
        .ok_or_else(|| conversion_error(path, "finite float", value))
}

fn to_opt_f64(path: FieldPath, value: &PatchValue) -> EditResult<Option<f64>> {
    if value.is_null() {
        return Ok(None);
    }
    to_f64(path, value).map(Some)
}

fn to_u32(path: FieldPath, value: &PatchValue) -> EditResult<u32> {
    value
        .as_i64()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| conversion_error(path, "non-negative integer", value))
}

fn to_opt_u32(path: FieldPath, value: &PatchValue) -> EditResult<Option<u32>> {
    if value.is_null() {
        return Ok(None);
    }
    to_u32(path, value).map(Some)
}

fn to_enum<T: NamedVariant>(path: FieldPath, value: &PatchValue) -> EditResult<T> {
    let expected = || format!("one of {}", T::names().join(", "));
    let text = value
        .as_text()
        .ok_or_else(|| conversion_error(path, expected(), value))?;
    T::parse_name(text).map_err(|_| conversion_error(path, expected(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use el_model::presets;

    #[test]
    fn later_edit_to_same_path_wins() {
        let base = presets::b6_minimal();
        let patch = Patch::new().set("Bore_mm", 80.0).set("Bore_mm", 81.0);
        let out = apply(&base, &patch).unwrap();
        assert_eq!(out.bore_mm, 81.0);
        assert_eq!(base.bore_mm, 78.0);
    }

    #[test]
    fn nested_records_are_written() {
        let base = presets::b6_minimal();
        let patch = Patch::new()
            .set("Cam.IntakeDuration_deg050", "245")
            .set("Friction.A_kPa", 75_i64);
        let out = apply(&base, &patch).unwrap();
        assert_eq!(out.cam.intake_duration_deg050, 245.0);
        assert_eq!(out.friction.a_kpa, 75.0);
        assert_eq!(out.cam.exhaust_duration_deg050, base.cam.exhaust_duration_deg050);
    }

    #[test]
    fn integers_accept_numeric_text_and_floats() {
        let base = presets::b6_minimal();
        let patch = Patch::new()
            .set("Redline_RPM", "7500")
            .set("RevLimit_RPM", 7700.0);
        let out = apply(&base, &patch).unwrap();
        assert_eq!(out.redline_rpm, 7500);
        assert_eq!(out.rev_limit_rpm, 7700);
    }

    #[test]
    fn enums_parse_case_insensitively() {
        let base = presets::b6_minimal();
        let patch = Patch::new()
            .set("header", "uel")
            .set("Toggles.CompressionBehavior", "fixedcr");
        let out = apply(&base, &patch).unwrap();
        assert_eq!(out.header, HeaderLayout::UnequalLength);
        assert_eq!(
            out.toggles.compression_behavior,
            CompressionBehavior::FixedCr
        );
    }

    #[test]
    fn null_clears_optional_leaf() {
        let base = presets::b6_minimal();
        let out = apply(&base, &Patch::new().set("CompressionRatio", PatchValue::Null)).unwrap();
        assert_eq!(out.compression_ratio, None);
    }

    #[test]
    fn null_on_required_leaf_fails() {
        let base = presets::b6_minimal();
        let err = apply(&base, &Patch::new().set("Bore_mm", PatchValue::Null)).unwrap_err();
        assert!(matches!(err, EditError::Conversion { .. }));
    }

    #[test]
    fn bad_enum_name_fails_whole_batch() {
        let base = presets::b6_minimal();
        let patch = Patch::new().set("Bore_mm", 80.0).set("Header", "tri-y");
        let err = apply(&base, &patch).unwrap_err();
        match err {
            EditError::Conversion { path, expected, .. } => {
                assert_eq!(path, "Header");
                assert!(expected.contains("UEL"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn negative_rpm_is_a_conversion_error() {
        let base = presets::b6_minimal();
        let err = apply(&base, &Patch::new().set("Redline_RPM", -1_i64)).unwrap_err();
        assert!(matches!(err, EditError::Conversion { .. }));
    }

    #[test]
    fn every_leaf_accepts_its_own_value() {
        let base = presets::b6_with_chamber();
        let edits: Vec<FieldEdit> = FieldPath::ALL
            .iter()
            .map(|&p| FieldEdit::new(p, p.read(&base)))
            .collect();
        let out = apply_edits(&base, &edits).unwrap();
        assert_eq!(out, base);
    }
}
