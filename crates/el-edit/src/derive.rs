//! Derived quantities recomputed after an edit batch.

use el_core::{cc_to_m3, circle_area, liters, mm, mm_to_m};
use el_model::{EngineSpec, FieldPath};
use tracing::{debug, warn};

use crate::{EditError, EditResult, FieldEdit, apply_edits};

/// Compression ratio from chamber geometry.
///
/// ```text
/// Ab      = pi/4 * bore^2
/// Vd      = Ab * stroke
/// Vgasket = pi/4 * gasket_bore^2 * gasket_thickness   (gasket bore defaults to bore)
/// Vc      = (chamber - dish) + Ab * deck + Vgasket
/// CR      = (Vd + Vc) / Vc
/// ```
///
/// Missing chamber, dish, deck and gasket inputs count as zero. Fails when the
/// clearance volume is not positive.
pub fn compression_ratio_from_geometry(spec: &EngineSpec) -> EditResult<f64> {
    let bore_m = mm_to_m(spec.bore_mm);
    let stroke_m = mm_to_m(spec.stroke_mm);
    let piston_area_m2 = std::f64::consts::FRAC_PI_4 * bore_m * bore_m;
    let swept_m3 = piston_area_m2 * stroke_m;

    let chamber_m3 = cc_to_m3(spec.chamber_volume_cc.unwrap_or(0.0));
    let dish_m3 = cc_to_m3(spec.piston_dish_volume_cc.unwrap_or(0.0));
    let deck_m = mm_to_m(spec.deck_clearance_mm.unwrap_or(0.0));
    let gasket_bore_m = mm_to_m(spec.head_gasket_bore_mm.unwrap_or(spec.bore_mm));
    let gasket_thickness_m = mm_to_m(spec.head_gasket_thickness_mm.unwrap_or(0.0));
    let gasket_m3 = std::f64::consts::FRAC_PI_4 * gasket_bore_m * gasket_bore_m * gasket_thickness_m;

    let clearance_m3 = (chamber_m3 - dish_m3) + piston_area_m2 * deck_m + gasket_m3;
    if clearance_m3 <= 0.0 || !clearance_m3.is_finite() {
        warn!(clearance_m3, "non-physical chamber geometry");
        return Err(EditError::NonPhysicalGeometry { clearance_m3 });
    }
    Ok((swept_m3 + clearance_m3) / clearance_m3)
}

/// Snapshot after derived fields were brought back in line.
#[derive(Debug, Clone, PartialEq)]
pub struct Derived {
    pub spec: EngineSpec,
    pub compression_ratio: f64,
}

/// Recompute dependent fields of `spec`.
///
/// Returns `Ok(None)` when the active policy derives nothing (fixed
/// compression ratio, or no chamber geometry present). The recomputed ratio
/// is written through the patch applier like any other edit.
pub fn resolve_derived(spec: &EngineSpec) -> EditResult<Option<Derived>> {
    if !spec.geometry_defines_cr() {
        return Ok(None);
    }
    let cr = compression_ratio_from_geometry(spec)?;
    let spec = apply_edits(spec, &[FieldEdit::new(FieldPath::CompressionRatio, cr)])?;
    debug!(compression_ratio = cr, "compression ratio derived from geometry");
    Ok(Some(Derived {
        spec,
        compression_ratio: cr,
    }))
}

/// Total swept volume in litres.
pub fn displacement_liters(spec: &EngineSpec) -> f64 {
    let swept = circle_area(mm(spec.bore_mm)) * mm(spec.stroke_mm);
    liters(swept) * f64::from(spec.cylinders)
}

/// Mean piston speed at `rpm` in m/s.
pub fn mean_piston_speed_mps(spec: &EngineSpec, rpm: u32) -> f64 {
    2.0 * mm_to_m(spec.stroke_mm) * f64::from(rpm) / 60.0
}
