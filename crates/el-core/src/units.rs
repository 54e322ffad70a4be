// el-core/src/units.rs
//
// Engine inputs arrive in millimetres and cubic centimetres; formulas work
// in SI.

use uom::si::f64::{Area as UomArea, Length as UomLength, Volume as UomVolume};

// Public canonical unit types (SI, f64)
pub type Area = UomArea;
pub type Length = UomLength;
pub type Volume = UomVolume;

#[inline]
pub fn mm(v: f64) -> Length {
    use uom::si::length::millimeter;
    Length::new::<millimeter>(v)
}

#[inline]
pub fn cc(v: f64) -> Volume {
    use uom::si::volume::cubic_centimeter;
    Volume::new::<cubic_centimeter>(v)
}

#[inline]
pub fn m3(v: f64) -> Volume {
    use uom::si::volume::cubic_meter;
    Volume::new::<cubic_meter>(v)
}

/// Millimetres to metres as a plain number.
#[inline]
pub fn mm_to_m(v: f64) -> f64 {
    use uom::si::length::meter;
    mm(v).get::<meter>()
}

/// Cubic centimetres to cubic metres as a plain number.
#[inline]
pub fn cc_to_m3(v: f64) -> f64 {
    use uom::si::volume::cubic_meter;
    cc(v).get::<cubic_meter>()
}

#[inline]
pub fn liters(v: Volume) -> f64 {
    use uom::si::volume::liter;
    v.get::<liter>()
}

/// Area of a circle of the given diameter.
#[inline]
pub fn circle_area(diameter: Length) -> Area {
    diameter * diameter * std::f64::consts::FRAC_PI_4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_match_factors() {
        assert!((mm_to_m(78.0) - 0.078).abs() < 1e-15);
        assert!((cc_to_m3(40.0) - 40.0e-6).abs() < 1e-18);
        assert!((liters(m3(0.0016)) - 1.6).abs() < 1e-12);
    }

    #[test]
    fn circle_area_of_bore() {
        use uom::si::area::square_meter;
        let a = circle_area(mm(78.0)).get::<square_meter>();
        let expected = std::f64::consts::FRAC_PI_4 * 0.078 * 0.078;
        assert!((a - expected).abs() < 1e-15);
    }
}
