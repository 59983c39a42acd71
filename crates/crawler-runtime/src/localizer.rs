//! Pose estimation from the odometry pods and IMU.
//!
//! # Localizers
//!
//! | Type | Position | Heading |
//! |---|---|---|
//! | [`EncoderLocalizer`] | x = mean parallel pod distance, y = lateral pod distance | IMU |
//! | [`TrackingOdometry`] | incremental dead reckoning, rotated into the field frame | pod difference |
//!
//! [`EncoderLocalizer`] ignores rotation entirely and is only accurate while
//! the heading stays near zero. It is the follower's default because it has
//! no state to drift.

use crawler_geometry::Pose;
use crawler_hal::{HeadingSensor, OdometryPods};
use crawler_types::config::OdometryConfig;
use crawler_types::{AngleUnit, CrawlerError};
use tracing::trace;

/// Anything that can report the robot's current field pose.
pub trait PoseSource {
    /// Sample the pose for this tick.
    ///
    /// # Errors
    ///
    /// Propagates [`CrawlerError::SensorUnavailable`] from the underlying
    /// sensors; callers skip the tick.
    fn pose(&mut self) -> Result<Pose, CrawlerError>;
}

fn sign(reversed: bool) -> f64 {
    if reversed { -1.0 } else { 1.0 }
}

// ─────────────────────────────────────────────────────────────────────────────
// EncoderLocalizer
// ─────────────────────────────────────────────────────────────────────────────

pub struct EncoderLocalizer<'a> {
    pods: &'a OdometryPods,
    imu: &'a dyn HeadingSensor,
    ticks_per_meter: f64,
    parallel_sign: f64,
    lateral_sign: f64,
}

impl<'a> EncoderLocalizer<'a> {
    pub fn new(pods: &'a OdometryPods, imu: &'a dyn HeadingSensor, odometry: &OdometryConfig) -> Self {
        Self {
            pods,
            imu,
            ticks_per_meter: odometry.ticks_per_meter(),
            parallel_sign: sign(odometry.parallel_reversed),
            lateral_sign: sign(odometry.lateral_reversed),
        }
    }
}

impl PoseSource for EncoderLocalizer<'_> {
    fn pose(&mut self) -> Result<Pose, CrawlerError> {
        let heading = self.imu.yaw(AngleUnit::Radians)?;
        let x = self.pods.parallel_average()? * self.parallel_sign / self.ticks_per_meter;
        let y = self.pods.lateral()? * self.lateral_sign / self.ticks_per_meter;
        Ok(Pose::new(x, y, heading))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TrackingOdometry
// ─────────────────────────────────────────────────────────────────────────────

/// Three-wheel dead reckoning.
///
/// Each update converts the pod deltas since the previous update into a
/// robot-frame displacement and heading change, then rotates the
/// displacement into the field frame at the mid-step heading. The first
/// update only records the baseline counts.
pub struct TrackingOdometry<'a> {
    pods: &'a OdometryPods,
    geometry: OdometryConfig,
    ticks_per_meter: f64,
    last_ticks: Option<[f64; 3]>,
    pose: Pose,
    anchored_to_counters: bool,
}

impl<'a> TrackingOdometry<'a> {
    pub fn new(pods: &'a OdometryPods, geometry: &OdometryConfig) -> Self {
        Self::starting_at(pods, geometry, Pose::origin())
    }

    pub fn starting_at(pods: &'a OdometryPods, geometry: &OdometryConfig, start: Pose) -> Self {
        Self {
            pods,
            geometry: *geometry,
            ticks_per_meter: geometry.ticks_per_meter(),
            last_ticks: None,
            pose: start,
            anchored_to_counters: false,
        }
    }

    /// Start from the pose the raw counts imply, so positions share the
    /// frame fixed when the pods were last zeroed, as [`EncoderLocalizer`]
    /// positions do.
    pub fn from_counters(pods: &'a OdometryPods, geometry: &OdometryConfig) -> Self {
        Self {
            anchored_to_counters: true,
            ..Self::new(pods, geometry)
        }
    }

    /// Last integrated pose without sampling the pods.
    pub fn current(&self) -> Pose {
        self.pose
    }

    fn read_ticks(&self) -> Result<[f64; 3], CrawlerError> {
        let parallel = sign(self.geometry.parallel_reversed);
        let lateral = sign(self.geometry.lateral_reversed);
        Ok([
            self.pods.left.ticks()? * parallel,
            self.pods.right.ticks()? * parallel,
            self.pods.center.ticks()? * lateral,
        ])
    }

    fn counter_pose(&self, ticks: [f64; 3]) -> Pose {
        let tpm = self.ticks_per_meter;
        let heading = if self.geometry.track_width_m.abs() < 1e-12 {
            0.0
        } else {
            (ticks[1] - ticks[0]) / tpm / self.geometry.track_width_m
        };
        Pose::new(
            (ticks[0] + ticks[1]) / 2.0 / tpm,
            ticks[2] / tpm,
            heading,
        )
    }

    /// Integrate the motion since the previous update.
    pub fn update(&mut self) -> Result<Pose, CrawlerError> {
        let ticks = self.read_ticks()?;
        let Some(prev) = self.last_ticks.replace(ticks) else {
            if self.anchored_to_counters {
                self.pose = self.counter_pose(ticks);
            }
            return Ok(self.pose);
        };

        let tpm = self.ticks_per_meter;
        let d_left = (ticks[0] - prev[0]) / tpm;
        let d_right = (ticks[1] - prev[1]) / tpm;
        let d_center = (ticks[2] - prev[2]) / tpm;

        let d_theta = if self.geometry.track_width_m.abs() < 1e-12 {
            0.0
        } else {
            (d_right - d_left) / self.geometry.track_width_m
        };
        let dx_robot = (d_left + d_right) / 2.0;
        let dy_robot = d_center - self.geometry.center_wheel_offset_m * d_theta;

        let mid = self.pose.heading + d_theta / 2.0;
        let (sin, cos) = mid.sin_cos();
        self.pose = Pose::new(
            self.pose.x + dx_robot * cos - dy_robot * sin,
            self.pose.y + dx_robot * sin + dy_robot * cos,
            self.pose.heading + d_theta,
        );
        trace!(x = self.pose.x, y = self.pose.y, heading = self.pose.heading, "odometry");
        Ok(self.pose)
    }
}

impl PoseSource for TrackingOdometry<'_> {
    fn pose(&mut self) -> Result<Pose, CrawlerError> {
        self.update()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawler_hal::SimRobot;
    use crawler_types::CrawlerConfig;

    fn geometry() -> OdometryConfig {
        CrawlerConfig::default().odometry
    }

    #[test]
    fn encoder_localizer_reads_raw_pods() {
        let (hw, plant) = SimRobot::builder().build();
        let tpm = geometry().ticks_per_meter();
        plant.set_encoder_ticks(0.4 * tpm, 0.6 * tpm, -0.2 * tpm);
        plant.set_pose(0.0, 0.0, 0.25);

        let mut loc = EncoderLocalizer::new(&hw.pods, &*hw.imu, &geometry());
        let pose = loc.pose().unwrap();
        assert!((pose.x - 0.5).abs() < 1e-9);
        assert!((pose.y + 0.2).abs() < 1e-9);
        assert!((pose.heading - 0.25).abs() < 1e-9);
    }

    #[test]
    fn reversed_pods_flip_sign() {
        let (hw, plant) = SimRobot::builder().build();
        let mut odo = geometry();
        odo.parallel_reversed = true;
        let tpm = odo.ticks_per_meter();
        plant.set_encoder_ticks(tpm, tpm, tpm);

        let mut loc = EncoderLocalizer::new(&hw.pods, &*hw.imu, &odo);
        let pose = loc.pose().unwrap();
        assert!((pose.x + 1.0).abs() < 1e-9);
        assert!((pose.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unavailable_imu_is_reported() {
        let (hw, plant) = SimRobot::builder().build();
        plant.fail_next_reads(1);
        let mut loc = EncoderLocalizer::new(&hw.pods, &*hw.imu, &geometry());
        assert!(loc.pose().unwrap_err().is_recoverable());
        assert!(loc.pose().is_ok());
    }

    #[test]
    fn tracking_first_update_sets_baseline() {
        let (hw, plant) = SimRobot::builder().build();
        plant.set_encoder_ticks(500.0, 500.0, 500.0);
        let mut odo = TrackingOdometry::new(&hw.pods, &geometry());
        assert_eq!(odo.update().unwrap(), Pose::origin());
    }

    #[test]
    fn tracking_straight_line() {
        let (hw, plant) = SimRobot::builder().build();
        let tpm = geometry().ticks_per_meter();
        let mut odo = TrackingOdometry::new(&hw.pods, &geometry());
        odo.update().unwrap();

        plant.set_encoder_ticks(0.3 * tpm, 0.3 * tpm, 0.1 * tpm);
        let pose = odo.update().unwrap();
        assert!((pose.x - 0.3).abs() < 1e-9);
        assert!((pose.y - 0.1).abs() < 1e-9);
        assert!(pose.heading.abs() < 1e-12);
    }

    #[test]
    fn tracking_rotates_displacement_into_field_frame() {
        let (hw, plant) = SimRobot::builder().build();
        let tpm = geometry().ticks_per_meter();
        let start = Pose::new(1.0, 1.0, std::f64::consts::FRAC_PI_2);
        let mut odo = TrackingOdometry::starting_at(&hw.pods, &geometry(), start);
        odo.update().unwrap();

        // Straight ahead while facing +y.
        plant.set_encoder_ticks(0.5 * tpm, 0.5 * tpm, 0.0);
        let pose = odo.update().unwrap();
        assert!((pose.x - 1.0).abs() < 1e-9);
        assert!((pose.y - 1.5).abs() < 1e-9);
    }

    #[test]
    fn tracking_from_counters_starts_where_the_pods_say() {
        let (hw, plant) = SimRobot::builder().build();
        let g = geometry();
        let tpm = g.ticks_per_meter();
        plant.set_encoder_ticks(0.3 * tpm, 0.3 * tpm, -0.1 * tpm);

        let mut odo = TrackingOdometry::from_counters(&hw.pods, &g);
        let start = odo.update().unwrap();
        assert!((start.x - 0.3).abs() < 1e-9);
        assert!((start.y + 0.1).abs() < 1e-9);
        assert!(start.heading.abs() < 1e-12);

        plant.set_encoder_ticks(0.5 * tpm, 0.5 * tpm, -0.1 * tpm);
        let pose = odo.update().unwrap();
        assert!((pose.x - 0.5).abs() < 1e-9);
        assert!((pose.y + 0.1).abs() < 1e-9);
    }

    #[test]
    fn tracking_in_place_turn_changes_heading_only() {
        let (hw, plant) = SimRobot::builder().build();
        let g = geometry();
        let tpm = g.ticks_per_meter();
        let mut odo = TrackingOdometry::new(&hw.pods, &g);
        odo.update().unwrap();

        // Right pod forward, left pod back: counter-clockwise.
        let arc = 0.1 * g.track_width_m / 2.0;
        plant.set_encoder_ticks(-arc * tpm, arc * tpm, 0.0);
        let pose = odo.update().unwrap();
        assert!((pose.heading - 0.1).abs() < 1e-9);
        assert!(pose.x.abs() < 1e-9 && pose.y.abs() < 1e-9);
        assert_eq!(odo.current(), pose);
    }
}
