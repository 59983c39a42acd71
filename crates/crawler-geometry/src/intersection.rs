//! Line/circle intersection restricted to a finite segment.
//!
//! The circle is translated to the origin and intersected with the infinite
//! line through the segment using the discriminant form
//! `r²·dr² − D²`. Each algebraic root is kept only if it passes
//! [`is_point_on_segment`].
//!
//! # Example
//!
//! ```rust
//! use crawler_geometry::{line_circle_intersections, Pose};
//!
//! let hits = line_circle_intersections(
//!     Pose::origin(),
//!     3.0,
//!     Pose::point(-5.0, 0.0),
//!     Pose::point(5.0, 0.0),
//! );
//! assert_eq!(hits.len(), 2);
//! ```

use tracing::trace;

use crate::pose::Pose;

/// Slack applied to each side of the segment's bounding box so hits that
/// land just past an endpoint through rounding are still admitted.
pub const SEGMENT_TOLERANCE: f64 = 0.1;

/// `true` when `p` lies inside the axis-aligned bounding box of the segment
/// `start → end`, expanded by `tolerance` on every side.
///
/// Callers only pass points already known to lie on the segment's line, so
/// the box test is a containment test along the segment.
pub fn is_point_on_segment(p: &Pose, start: &Pose, end: &Pose, tolerance: f64) -> bool {
    p.x >= start.x.min(end.x) - tolerance
        && p.x <= start.x.max(end.x) + tolerance
        && p.y >= start.y.min(end.y) - tolerance
        && p.y <= start.y.max(end.y) + tolerance
}

/// Intersections of the circle (`center`, `radius`) with the segment
/// `start → end`, using [`SEGMENT_TOLERANCE`].
pub fn line_circle_intersections(center: Pose, radius: f64, start: Pose, end: Pose) -> Vec<Pose> {
    line_circle_intersections_with_tolerance(center, radius, start, end, SEGMENT_TOLERANCE)
}

/// Intersections of the circle (`center`, `radius`) with the segment
/// `start → end`.
///
/// Returns zero, one (tangent) or two points. Every returned pose carries
/// `start.heading`, not an interpolated heading. A zero-length segment has no
/// defined line and yields no points.
pub fn line_circle_intersections_with_tolerance(
    center: Pose,
    radius: f64,
    start: Pose,
    end: Pose,
    tolerance: f64,
) -> Vec<Pose> {
    let x1 = start.x - center.x;
    let y1 = start.y - center.y;
    let x2 = end.x - center.x;
    let y2 = end.y - center.y;

    let dx = x2 - x1;
    let dy = y2 - y1;
    let dr_sq = dx * dx + dy * dy;
    if dr_sq <= f64::EPSILON {
        trace!(x = start.x, y = start.y, "skipping zero-length segment");
        return Vec::new();
    }
    let d = x1 * y2 - x2 * y1;

    let discriminant = radius * radius * dr_sq - d * d;
    if discriminant < 0.0 {
        return Vec::new();
    }

    let root = discriminant.sqrt();
    let sign_dy = if dy < 0.0 { -1.0 } else { 1.0 };

    let candidate = |s: f64| {
        Pose {
            x: (d * dy + s * sign_dy * dx * root) / dr_sq + center.x,
            y: (-d * dx + s * dy.abs() * root) / dr_sq + center.y,
            heading: start.heading,
        }
    };

    let roots: &[f64] = if discriminant == 0.0 { &[1.0] } else { &[1.0, -1.0] };
    roots
        .iter()
        .map(|s| candidate(*s))
        .filter(|p| is_point_on_segment(p, &start, &end, tolerance))
        .collect()
}
