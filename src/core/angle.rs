//! Conversion between the meteorological bearing convention ("coming from",
//! clockwise from true north, degrees) and the mathematical convention
//! (counter-clockwise from east, radians).

/// `deg2rad((270 - met_deg) mod 360)`, with a non-negative modulus.
pub fn met_to_math(met_deg: f64) -> f64 {
    (270.0 - met_deg).rem_euclid(360.0).to_radians()
}

/// Inverse of [`met_to_math`]; result is in `[0, 360)`.
pub fn math_to_met(math_rad: f64) -> f64 {
    (270.0 - math_rad.to_degrees()).rem_euclid(360.0)
}

/// Absent bearings stay absent.
pub fn met_to_math_opt(met_deg: Option<f64>) -> Option<f64> {
    met_deg.map(met_to_math)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_cardinal_bearings() {
        // From the west travels east: 0 rad
        assert!(close(met_to_math(270.0), 0.0));
        // From the south travels north
        assert!(close(met_to_math(180.0), FRAC_PI_2));
        assert!(close(met_to_math(90.0), PI));
        assert!(close(met_to_math(0.0), 3.0 * FRAC_PI_2));
    }

    #[test]
    fn test_out_of_range_inputs_wrap() {
        assert!(close(met_to_math(-90.0), met_to_math(270.0)));
        assert!(close(met_to_math(720.0 + 45.0), met_to_math(45.0)));
        assert!(met_to_math(300.0) >= 0.0);
    }

    #[test]
    fn test_round_trip_recovers_bearing() {
        for bearing in [0.0, 1.5, 45.0, 179.0, 270.0, 359.0, 400.0, -30.0] {
            let back = math_to_met(met_to_math(bearing));
            let expected = f64::rem_euclid(bearing, 360.0);
            let diff = (back - expected).abs();
            assert!(diff < 1e-9 || (360.0 - diff) < 1e-9, "{bearing} -> {back}");
        }
    }

    #[test]
    fn test_absent_propagates() {
        assert_eq!(met_to_math_opt(None), None);
        assert!(close(met_to_math_opt(Some(270.0)).unwrap(), 0.0));
    }
}
