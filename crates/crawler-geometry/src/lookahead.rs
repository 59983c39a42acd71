//! Pure-pursuit lookahead point selection.

use crate::intersection::line_circle_intersections_with_tolerance;
use crate::pose::Pose;

/// Point on `path` at `radius` from `robot` that pure pursuit steers toward.
///
/// Every consecutive segment is intersected with the lookahead circle in path
/// order and the last hit wins, so later segments override earlier ones.
/// Within one segment the hit furthest along the segment counts, and hits
/// behind the robot's own projection onto the segment are ignored. When no
/// segment yields a hit the final waypoint is returned, which is what lets
/// the robot close the last `radius` of the path. An empty path has no
/// target.
pub fn find_lookahead_point(
    path: &[Pose],
    robot: Pose,
    radius: f64,
    tolerance: f64,
) -> Option<Pose> {
    let last = *path.last()?;
    let hit = path
        .windows(2)
        .filter_map(|seg| furthest_hit_ahead(seg[0], seg[1], robot, radius, tolerance))
        .last();
    Some(hit.unwrap_or(last))
}

fn furthest_hit_ahead(
    start: Pose,
    end: Pose,
    robot: Pose,
    radius: f64,
    tolerance: f64,
) -> Option<Pose> {
    let (ux, uy) = start.delta_to(&end);
    let progress = |p: &Pose| {
        let (px, py) = start.delta_to(p);
        px * ux + py * uy
    };
    let robot_progress = progress(&robot);
    line_circle_intersections_with_tolerance(robot, radius, start, end, tolerance)
        .into_iter()
        .map(|p| (progress(&p), p))
        .filter(|(t, _)| *t >= robot_progress)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, p)| p)
}
