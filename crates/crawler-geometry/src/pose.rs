//! [`Pose`] – a 2-D rigid transform on the field or robot frame.

use crate::angle::normalize_radians;

/// Position plus heading.
///
/// `heading` is in radians, normalized to `(-π, π]` at construction. Poses
/// are plain values: operations return new poses instead of mutating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}

impl Pose {
    /// Create a pose, wrapping `heading` (radians) into `(-π, π]`.
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Self {
            x,
            y,
            heading: normalize_radians(heading),
        }
    }

    /// Create a pose from a heading in degrees.
    pub fn from_degrees(x: f64, y: f64, heading_deg: f64) -> Self {
        Self::new(x, y, heading_deg.to_radians())
    }

    /// The origin, facing +X.
    pub fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// A point carrying no meaningful heading.
    pub fn point(x: f64, y: f64) -> Self {
        Self::new(x, y, 0.0)
    }

    pub fn heading_degrees(&self) -> f64 {
        self.heading.to_degrees()
    }

    /// Same position, different heading.
    pub fn with_heading(self, heading: f64) -> Self {
        Self::new(self.x, self.y, heading)
    }

    /// `(other.x - self.x, other.y - self.y)`.
    pub fn delta_to(&self, other: &Pose) -> (f64, f64) {
        (other.x - self.x, other.y - self.y)
    }

    /// Euclidean distance between the two positions; headings are ignored.
    pub fn distance_to(&self, other: &Pose) -> f64 {
        let (dx, dy) = self.delta_to(other);
        dx.hypot(dy)
    }

    /// Field bearing from this position toward `other`, in radians.
    pub fn bearing_to(&self, other: &Pose) -> f64 {
        let (dx, dy) = self.delta_to(other);
        dy.atan2(dx)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::origin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn heading_is_normalized_on_construction() {
        let p = Pose::new(0.0, 0.0, 3.0 * PI);
        assert!((p.heading - PI).abs() < 1e-9);
        let p = Pose::from_degrees(1.0, 2.0, -270.0);
        assert!((p.heading - FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn distance_ignores_heading() {
        let a = Pose::new(0.0, 0.0, 1.0);
        let b = Pose::new(3.0, 4.0, -2.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-12);
        assert!((b.distance_to(&a) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn bearing_points_at_target() {
        let a = Pose::origin();
        assert!((a.bearing_to(&Pose::point(0.0, 1.0)) - FRAC_PI_2).abs() < 1e-12);
        assert!((a.bearing_to(&Pose::point(-1.0, 0.0)) - PI).abs() < 1e-12);
    }

    #[test]
    fn with_heading_returns_new_value() {
        let a = Pose::point(1.0, 1.0);
        let b = a.with_heading(FRAC_PI_2);
        assert_eq!(a.heading, 0.0);
        assert!((b.heading - FRAC_PI_2).abs() < 1e-12);
        assert_eq!((a.x, a.y), (b.x, b.y));
    }
}
