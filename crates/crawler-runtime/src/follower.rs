//! Pure-pursuit path follower with percentage markers.
//!
//! Each tick the follower samples a [`PoseSource`], fires any markers whose
//! completion percentage has been reached, picks a lookahead point on the
//! path and hands a field-relative command to a [`FieldDrive`].
//!
//! Completion is measured as straight-line distance from the start pose over
//! straight-line distance from the start pose to the final waypoint. On a
//! path that curves away and back this overstates progress mid-path (the
//! percentage is clamped to 100), so markers on such paths fire early.
//!
//! # Example
//!
//! ```rust
//! use crawler_runtime::follower::PathMarker;
//!
//! let marker = PathMarker::new("intake on", 25.0, || Ok(()));
//! assert_eq!(marker.percentage(), 25.0);
//! ```

use std::thread;
use std::time::Duration;

use crawler_geometry::{Pose, find_lookahead_point, normalize_radians};
use crawler_hal::Drivetrain;
use crawler_types::{CrawlerConfig, CrawlerError, MotionOutcome};
use tracing::{debug, info, instrument, trace, warn};

use crate::cancel::CancelToken;
use crate::deadline::Deadline;
use crate::localizer::PoseSource;

/// Guard added to divisors that may be zero.
const EPSILON: f64 = 1e-6;

// ─────────────────────────────────────────────────────────────────────────────
// Markers
// ─────────────────────────────────────────────────────────────────────────────

/// Side effect run on the control thread when a marker fires.
pub type MarkerAction = Box<dyn FnMut() -> Result<(), CrawlerError> + Send>;

/// A one-shot trigger at a fraction of the path.
///
/// Returning [`CrawlerError::Interrupted`] from the action stops the path
/// gracefully; any other error aborts it.
pub struct PathMarker {
    name: String,
    percentage: f64,
    action: MarkerAction,
}

impl PathMarker {
    pub fn new(
        name: impl Into<String>,
        percentage: f64,
        action: impl FnMut() -> Result<(), CrawlerError> + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            percentage,
            action: Box::new(action),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    fn fire(&mut self) -> Result<(), CrawlerError> {
        (self.action)()
    }
}

impl std::fmt::Debug for PathMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathMarker")
            .field("name", &self.name)
            .field("percentage", &self.percentage)
            .finish_non_exhaustive()
    }
}

/// Indices of `markers` in firing order: ascending percentage, ties in list
/// order. Markers without a finite percentage never fire.
fn firing_order(markers: &[PathMarker]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..markers.len())
        .filter(|&i| {
            let finite = markers[i].percentage.is_finite();
            if !finite {
                debug!(
                    marker = markers[i].name(),
                    percentage = markers[i].percentage,
                    "marker skipped: percentage is not finite"
                );
            }
            finite
        })
        .collect();
    order.sort_by(|&a, &b| markers[a].percentage.total_cmp(&markers[b].percentage));
    order
}

// ─────────────────────────────────────────────────────────────────────────────
// Actuation seam
// ─────────────────────────────────────────────────────────────────────────────

/// Field-relative actuation used by the follower.
pub trait FieldDrive {
    /// `forward`/`strafe` along the field axes, `turn_ccw` counter-clockwise,
    /// `heading` the robot's current heading in radians.
    fn drive_field(
        &mut self,
        forward: f64,
        strafe: f64,
        turn_ccw: f64,
        heading: f64,
    ) -> Result<(), CrawlerError>;

    fn halt(&mut self) -> Result<(), CrawlerError>;
}

impl FieldDrive for Drivetrain {
    fn drive_field(
        &mut self,
        forward: f64,
        strafe: f64,
        turn_ccw: f64,
        heading: f64,
    ) -> Result<(), CrawlerError> {
        self.drive_field_relative(forward, strafe, turn_ccw, heading)
            .map(|_| ())
    }

    fn halt(&mut self) -> Result<(), CrawlerError> {
        self.stop()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Follower
// ─────────────────────────────────────────────────────────────────────────────

/// Field-relative command for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PursuitCommand {
    pub forward: f64,
    pub strafe: f64,
    pub turn_ccw: f64,
}

/// Tuning snapshot taken from a [`CrawlerConfig`].
#[derive(Debug, Clone)]
pub struct PathFollower {
    lookahead: f64,
    finish_threshold: f64,
    segment_tolerance: f64,
    kp: f64,
    max_speed: f64,
    min_power: f64,
    steer_gain: f64,
    loop_period: Duration,
    timeout: Option<Duration>,
    cancel: CancelToken,
}

impl PathFollower {
    pub fn new(config: &CrawlerConfig, cancel: CancelToken) -> Self {
        let f = &config.follower;
        Self {
            lookahead: f.lookahead_m,
            finish_threshold: f.finish_threshold_m,
            segment_tolerance: f.segment_tolerance_m,
            kp: f.kp,
            max_speed: f.max_speed,
            min_power: config.min_power,
            steer_gain: config.steer_gain,
            loop_period: config.loop_period(),
            timeout: config.follower_timeout(),
            cancel,
        }
    }

    /// Steering and speed toward `target` from `pose`.
    pub fn command_toward(&self, pose: Pose, target: Pose) -> PursuitCommand {
        let (dx, dy) = pose.delta_to(&target);
        let distance = dx.hypot(dy);
        let heading_error = normalize_radians(dy.atan2(dx) - pose.heading);
        let speed = (distance * self.kp).min(self.max_speed).max(self.min_power);
        PursuitCommand {
            forward: dx / (distance + EPSILON) * speed,
            strafe: dy / (distance + EPSILON) * speed,
            turn_ccw: heading_error * self.steer_gain,
        }
    }

    /// Follow `path` until its final waypoint is within the finish threshold,
    /// the token is cancelled, or the optional timeout expires.
    ///
    /// Every exit that reached the loop commands zero power first. Markers
    /// fire at most once per call; those never reached are dropped.
    ///
    /// # Errors
    ///
    /// Hardware faults and non-interrupt marker errors are returned after the
    /// drive has been halted.
    #[instrument(skip_all, fields(waypoints = path.len(), markers = markers.len()))]
    pub fn run_path<P, D>(
        &self,
        source: &mut P,
        drive: &mut D,
        path: &[Pose],
        markers: &mut [PathMarker],
    ) -> Result<MotionOutcome, CrawlerError>
    where
        P: PoseSource + ?Sized,
        D: FieldDrive + ?Sized,
    {
        let Some(&final_point) = path.last() else {
            debug!("empty path; nothing to follow");
            return Ok(MotionOutcome::Converged);
        };

        let result = self.pursue(source, drive, path, final_point, markers);
        let halted = drive.halt();
        let outcome = result?;
        halted?;
        Ok(outcome)
    }

    fn pursue<P, D>(
        &self,
        source: &mut P,
        drive: &mut D,
        path: &[Pose],
        final_point: Pose,
        markers: &mut [PathMarker],
    ) -> Result<MotionOutcome, CrawlerError>
    where
        P: PoseSource + ?Sized,
        D: FieldDrive + ?Sized,
    {
        let deadline = Deadline::maybe_after(self.timeout);
        let mut pending = firing_order(markers).into_iter().peekable();
        let mut start: Option<(Pose, f64)> = None;

        loop {
            if self.cancel.is_cancelled() {
                info!("path cancelled");
                return Ok(MotionOutcome::Cancelled);
            }
            if deadline.expired() {
                warn!(elapsed = ?deadline.elapsed(), "path timed out");
                return Ok(MotionOutcome::TimedOut);
            }

            let pose = match source.pose() {
                Ok(pose) => pose,
                Err(e) if e.is_recoverable() => {
                    debug!(error = %e, "pose unavailable; skipping tick");
                    self.pause();
                    continue;
                }
                Err(e) => return Err(e),
            };
            let (start_pose, total) =
                *start.get_or_insert_with(|| (pose, pose.distance_to(&final_point)));

            let percent = (start_pose.distance_to(&pose) / (total + EPSILON) * 100.0).clamp(0.0, 100.0);
            while let Some(&i) = pending.peek() {
                if markers[i].percentage > percent {
                    break;
                }
                pending.next();
                info!(marker = markers[i].name(), percent, "marker fired");
                match markers[i].fire() {
                    Ok(()) => {}
                    Err(CrawlerError::Interrupted(reason)) => {
                        info!(%reason, "marker requested stop");
                        return Ok(MotionOutcome::Cancelled);
                    }
                    Err(e) => return Err(e),
                }
            }

            if pose.distance_to(&final_point) < self.finish_threshold {
                let dropped = pending.count();
                if dropped > 0 {
                    debug!(dropped, "unreached markers dropped");
                }
                info!(x = pose.x, y = pose.y, "path finished");
                return Ok(MotionOutcome::Converged);
            }

            let target = find_lookahead_point(path, pose, self.lookahead, self.segment_tolerance)
                .unwrap_or(final_point);
            let cmd = self.command_toward(pose, target);
            trace!(
                percent,
                target_x = target.x,
                target_y = target.y,
                forward = cmd.forward,
                strafe = cmd.strafe,
                turn = cmd.turn_ccw,
                "pursuit tick"
            );
            drive.drive_field(cmd.forward, cmd.strafe, cmd.turn_ccw, pose.heading)?;
            self.pause();
        }
    }

    fn pause(&self) {
        if !self.loop_period.is_zero() {
            thread::sleep(self.loop_period);
        }
    }
}
