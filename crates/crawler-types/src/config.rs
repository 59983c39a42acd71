//! Gains and limits injected into every controller at construction.
//!
//! A [`CrawlerConfig`] is read-only for the duration of a run; change it
//! between runs by building a new engine. Defaults carry the tuning of the
//! reference robot (48 mm odometry wheels, 2000-tick encoders).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::CrawlerError;

/// Proportional, integral and derivative gains of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisGains {
    pub kp: f64,
    #[serde(default)]
    pub ki: f64,
    #[serde(default)]
    pub kd: f64,
}

impl AxisGains {
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }

    /// Proportional-only gains.
    pub fn p(kp: f64) -> Self {
        Self::new(kp, 0.0, 0.0)
    }
}

/// Tuning of a distance axis (forward or strafe).
///
/// `gains.kp` acts on the error expressed in meters; `ki` and `kd` act on
/// raw encoder ticks. A table given in a config file replaces the axis
/// defaults as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceAxisConfig {
    pub gains: AxisGains,
    /// Integral accumulates only while `|error|` is below this many meters.
    pub integral_band_m: f64,
    /// Optional symmetric cap on the accumulated integral (ticks).
    #[serde(default)]
    pub integral_limit: Option<f64>,
    /// Converged once `|error|` is at or below this many ticks.
    pub stop_threshold_ticks: f64,
}

impl DistanceAxisConfig {
    fn drive() -> Self {
        Self {
            gains: AxisGains::p(0.6),
            integral_band_m: 0.1,
            integral_limit: None,
            stop_threshold_ticks: 50.0,
        }
    }

    fn strafe() -> Self {
        Self {
            gains: AxisGains::new(1.85, 0.00015, 0.0),
            integral_band_m: 0.1,
            integral_limit: Some(20.0),
            stop_threshold_ticks: 50.0,
        }
    }
}

/// Tuning of the in-place turn primitive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnAxisConfig {
    pub gains: AxisGains,
    pub output_max: f64,
    pub min_power: f64,
    pub integral_band_deg: f64,
    pub stop_threshold_deg: f64,
}

impl Default for TurnAxisConfig {
    fn default() -> Self {
        Self {
            gains: AxisGains::p(0.03),
            output_max: 0.6,
            min_power: 0.15,
            integral_band_deg: 5.0,
            stop_threshold_deg: 1.0,
        }
    }
}

/// Geometry of the dead-wheel odometry pods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OdometryConfig {
    pub wheel_diameter_m: f64,
    pub ticks_per_rev: f64,
    /// Distance between the left and right parallel pods.
    pub track_width_m: f64,
    /// Forward offset of the lateral pod from the center of rotation.
    pub center_wheel_offset_m: f64,
    /// Negate the parallel pods (mounted facing backwards).
    pub parallel_reversed: bool,
    /// Negate the lateral pod.
    pub lateral_reversed: bool,
}

impl OdometryConfig {
    pub fn circumference_m(&self) -> f64 {
        self.wheel_diameter_m * std::f64::consts::PI
    }

    /// Encoder ticks per meter of travel.
    pub fn ticks_per_meter(&self) -> f64 {
        self.ticks_per_rev / self.circumference_m()
    }
}

impl Default for OdometryConfig {
    fn default() -> Self {
        Self {
            wheel_diameter_m: 0.048,
            ticks_per_rev: 2000.0,
            track_width_m: 0.30,
            center_wheel_offset_m: 0.0,
            parallel_reversed: false,
            lateral_reversed: false,
        }
    }
}

/// Pose estimate the path follower steers by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocalizerKind {
    /// Raw pod distances as x/y plus IMU heading.
    #[default]
    Encoder,
    /// Incremental three-wheel dead reckoning.
    Tracking,
}

/// Pure-pursuit follower tuning. Distances in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowerConfig {
    pub lookahead_m: f64,
    pub finish_threshold_m: f64,
    /// Speed per meter of distance to the lookahead point.
    pub kp: f64,
    pub max_speed: f64,
    /// Slack around each segment when accepting lookahead intersections.
    pub segment_tolerance_m: f64,
    /// No time budget when absent.
    pub timeout_secs: Option<f64>,
    pub localizer: LocalizerKind,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self {
            lookahead_m: 0.05,
            finish_threshold_m: 0.02,
            kp: 60.0,
            max_speed: 0.7,
            segment_tolerance_m: 0.001,
            timeout_secs: None,
            localizer: LocalizerKind::Encoder,
        }
    }
}

/// Upper bound on any time budget, one hour.
pub const MAX_TIMEOUT_SECS: f64 = 3600.0;

/// Process-wide tuning bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlerConfig {
    #[serde(default = "DistanceAxisConfig::drive")]
    pub drive: DistanceAxisConfig,

    #[serde(default = "DistanceAxisConfig::strafe")]
    pub strafe: DistanceAxisConfig,

    #[serde(default)]
    pub turn: TurnAxisConfig,

    /// Heading-hold gain (per degree for the engine, per radian for the
    /// follower).
    #[serde(default = "default_steer_gain")]
    pub steer_gain: f64,

    /// Minimum effective power for the distance axes and the follower.
    #[serde(default = "default_min_power")]
    pub min_power: f64,

    /// Output clamp of the distance axes.
    #[serde(default = "default_power_clamp")]
    pub power_clamp: f64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,

    /// Zero-power hold after every primitive.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Sleep at each loop iteration boundary; `0` spins.
    #[serde(default = "default_loop_period_ms")]
    pub loop_period_ms: u64,

    /// Negate the heading setpoint on strafes, for robots whose IMU reads
    /// mirrored on the lateral axis.
    #[serde(default = "default_mirror_strafe_heading")]
    pub mirror_strafe_heading: bool,

    #[serde(default)]
    pub odometry: OdometryConfig,

    #[serde(default)]
    pub follower: FollowerConfig,
}

fn default_steer_gain() -> f64 {
    0.02
}
fn default_min_power() -> f64 {
    0.1
}
fn default_power_clamp() -> f64 {
    0.7
}
fn default_timeout_secs() -> f64 {
    4.0
}
fn default_settle_ms() -> u64 {
    100
}
fn default_loop_period_ms() -> u64 {
    5
}
fn default_mirror_strafe_heading() -> bool {
    true
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            drive: DistanceAxisConfig::drive(),
            strafe: DistanceAxisConfig::strafe(),
            turn: TurnAxisConfig::default(),
            steer_gain: default_steer_gain(),
            min_power: default_min_power(),
            power_clamp: default_power_clamp(),
            timeout_secs: default_timeout_secs(),
            settle_ms: default_settle_ms(),
            loop_period_ms: default_loop_period_ms(),
            mirror_strafe_heading: default_mirror_strafe_heading(),
            odometry: OdometryConfig::default(),
            follower: FollowerConfig::default(),
        }
    }
}

impl CrawlerConfig {
    pub fn ticks_per_meter(&self) -> f64 {
        self.odometry.ticks_per_meter()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn loop_period(&self) -> Duration {
        Duration::from_millis(self.loop_period_ms)
    }

    pub fn follower_timeout(&self) -> Option<Duration> {
        self.follower.timeout_secs.map(Duration::from_secs_f64)
    }

    /// Reject limits that would make a control loop misbehave.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<(), CrawlerError> {
        let non_negative = [
            ("steer_gain", self.steer_gain),
            ("min_power", self.min_power),
            ("timeout_secs", self.timeout_secs),
            ("drive.stop_threshold_ticks", self.drive.stop_threshold_ticks),
            ("strafe.stop_threshold_ticks", self.strafe.stop_threshold_ticks),
            ("drive.integral_band_m", self.drive.integral_band_m),
            ("strafe.integral_band_m", self.strafe.integral_band_m),
            ("turn.output_max", self.turn.output_max),
            ("turn.min_power", self.turn.min_power),
            ("turn.stop_threshold_deg", self.turn.stop_threshold_deg),
            ("follower.lookahead_m", self.follower.lookahead_m),
            ("follower.finish_threshold_m", self.follower.finish_threshold_m),
            ("follower.max_speed", self.follower.max_speed),
            ("follower.segment_tolerance_m", self.follower.segment_tolerance_m),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(CrawlerError::Config(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }

        if !(self.power_clamp > 0.0 && self.power_clamp <= 1.0) {
            return Err(CrawlerError::Config(format!(
                "power_clamp must be in (0, 1], got {}",
                self.power_clamp
            )));
        }
        if self.min_power > self.power_clamp {
            return Err(CrawlerError::Config(format!(
                "min_power ({}) exceeds power_clamp ({})",
                self.min_power, self.power_clamp
            )));
        }
        let tpm = self.ticks_per_meter();
        if !tpm.is_finite() || tpm <= 0.0 {
            return Err(CrawlerError::Config(format!(
                "odometry geometry yields invalid ticks per meter: {tpm}"
            )));
        }
        if let Some(t) = self.follower.timeout_secs
            && (!t.is_finite() || t < 0.0)
        {
            return Err(CrawlerError::Config(format!(
                "follower.timeout_secs must be non-negative, got {t}"
            )));
        }
        let budgets = [
            ("timeout_secs", Some(self.timeout_secs)),
            ("follower.timeout_secs", self.follower.timeout_secs),
        ];
        for (name, value) in budgets {
            if let Some(t) = value
                && t > MAX_TIMEOUT_SECS
            {
                return Err(CrawlerError::Config(format!(
                    "{name} must not exceed {MAX_TIMEOUT_SECS} s, got {t}"
                )));
            }
        }
        Ok(())
    }
}
