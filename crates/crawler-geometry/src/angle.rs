//! Heading wrap.
//!
//! Both functions map onto a half-open interval whose *upper* bound is
//! included: `(-180, 180]` and `(-π, π]`. The lower bound maps onto the upper
//! one, so `-180°` becomes `180°`.
//!
//! ```rust
//! use crawler_geometry::angle::normalize_degrees;
//!
//! assert_eq!(normalize_degrees(190.0), -170.0);
//! assert_eq!(normalize_degrees(-180.0), 180.0);
//! assert_eq!(normalize_degrees(720.0), 0.0);
//! ```

use std::f64::consts::TAU;

/// Wrap `degrees` into `(-180, 180]`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    wrap(degrees, 360.0)
}

/// Wrap `radians` into `(-π, π]`.
pub fn normalize_radians(radians: f64) -> f64 {
    wrap(radians, TAU)
}

fn wrap(value: f64, period: f64) -> f64 {
    let half = period / 2.0;
    // rem_euclid lands in [0, period]; the upper end is possible through
    // rounding of tiny negative inputs.
    let r = value.rem_euclid(period);
    if r > half { r - period } else { r }
}

/// Smallest signed difference `target - current`, in degrees.
pub fn heading_error_degrees(target: f64, current: f64) -> f64 {
    normalize_degrees(target - current)
}

/// Smallest signed difference `target - current`, in radians.
pub fn heading_error_radians(target: f64, current: f64) -> f64 {
    normalize_radians(target - current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn boundaries_map_to_positive_half_turn() {
        assert_eq!(normalize_degrees(180.0), 180.0);
        assert_eq!(normalize_degrees(-180.0), 180.0);
        assert_eq!(normalize_degrees(540.0), 180.0);
        assert_eq!(normalize_radians(PI), PI);
        assert_eq!(normalize_radians(-PI), PI);
    }

    #[test]
    fn result_is_always_in_range() {
        let mut a = -2000.0;
        while a <= 2000.0 {
            let n = normalize_degrees(a);
            assert!(n > -180.0 && n <= 180.0, "{a} -> {n}");
            a += 7.25;
        }
    }

    #[test]
    fn full_turns_do_not_change_the_result() {
        for a in [-359.0, -181.0, -90.0, 0.0, 45.5, 179.0, 181.0, 359.75] {
            for k in -3i32..=3 {
                let shifted = a + 360.0 * f64::from(k);
                assert!(
                    (normalize_degrees(shifted) - normalize_degrees(a)).abs() < 1e-9,
                    "{a} vs {shifted}"
                );
            }
        }
    }

    #[test]
    fn error_takes_the_short_way_round() {
        assert_eq!(heading_error_degrees(170.0, -170.0), -20.0);
        assert_eq!(heading_error_degrees(-170.0, 170.0), 20.0);
        assert!((heading_error_radians(0.1, -0.1) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn tiny_negative_input_stays_in_range() {
        let n = normalize_degrees(-1e-18);
        assert!(n > -180.0 && n <= 180.0);
        assert!(n.abs() < 1e-9);
    }
}
