//! `crawler-geometry` – planar geometry for the motion-control loops.
//!
//! # Modules
//!
//! - [`pose`] – [`Pose`][pose::Pose]: immutable 2-D position plus heading.
//! - [`angle`] – heading wrap into a half-open interval, in degrees and
//!   radians.
//! - [`intersection`] – line/circle intersection restricted to a finite
//!   segment, and the tolerant point-on-segment test it relies on.
//! - [`lookahead`] – the pure-pursuit lookahead search over a whole path.

pub mod angle;
pub mod intersection;
pub mod lookahead;
pub mod pose;

pub use angle::{normalize_degrees, normalize_radians};
pub use intersection::{
    is_point_on_segment, line_circle_intersections, line_circle_intersections_with_tolerance,
};
pub use lookahead::find_lookahead_point;
pub use pose::Pose;
