//! `crawler-types` – shared vocabulary for the Crawler motion-control stack.
//!
//! Every other crate in the workspace speaks in these types: wheel
//! identifiers and power vectors, the outcome of a blocking motion primitive,
//! the workspace-wide [`CrawlerError`], and the [`config`] bundle injected
//! into controllers at construction.

pub mod config;

pub use config::CrawlerConfig;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the four drive wheels of the mecanum base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WheelId {
    FrontLeft,
    FrontRight,
    BackLeft,
    BackRight,
}

impl WheelId {
    /// All wheels in command order.
    pub const ALL: [WheelId; 4] = [
        WheelId::FrontLeft,
        WheelId::FrontRight,
        WheelId::BackLeft,
        WheelId::BackRight,
    ];

    /// `true` for the two wheels on the left side of the chassis.
    pub fn is_left(self) -> bool {
        matches!(self, WheelId::FrontLeft | WheelId::BackLeft)
    }

    /// Stable hardware name, e.g. `"frontLeft"`.
    pub fn name(self) -> &'static str {
        match self {
            WheelId::FrontLeft => "frontLeft",
            WheelId::FrontRight => "frontRight",
            WheelId::BackLeft => "backLeft",
            WheelId::BackRight => "backRight",
        }
    }
}

impl std::fmt::Display for WheelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-wheel power command, each component in `[-1, 1]`.
///
/// Recomputed every control tick and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WheelPowers {
    pub front_left: f64,
    pub front_right: f64,
    pub back_left: f64,
    pub back_right: f64,
}

impl WheelPowers {
    /// All wheels stopped.
    pub const ZERO: WheelPowers = WheelPowers {
        front_left: 0.0,
        front_right: 0.0,
        back_left: 0.0,
        back_right: 0.0,
    };

    pub fn new(front_left: f64, front_right: f64, back_left: f64, back_right: f64) -> Self {
        Self {
            front_left,
            front_right,
            back_left,
            back_right,
        }
    }

    /// Power for a single wheel.
    pub fn get(&self, wheel: WheelId) -> f64 {
        match wheel {
            WheelId::FrontLeft => self.front_left,
            WheelId::FrontRight => self.front_right,
            WheelId::BackLeft => self.back_left,
            WheelId::BackRight => self.back_right,
        }
    }

    /// Largest absolute component.
    pub fn max_magnitude(&self) -> f64 {
        WheelId::ALL
            .iter()
            .map(|w| self.get(*w).abs())
            .fold(0.0, f64::max)
    }

    /// Jointly rescale so that no component exceeds 1 in magnitude.
    ///
    /// Commands already inside the unit range are returned unchanged, so the
    /// ratio between wheels is always preserved.
    pub fn normalized(self) -> Self {
        let max = self.max_magnitude();
        if max <= 1.0 {
            return self;
        }
        Self::new(
            self.front_left / max,
            self.front_right / max,
            self.back_left / max,
            self.back_right / max,
        )
    }

    /// `true` when every wheel is commanded to exactly zero.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

/// Unit in which a heading sensor reports yaw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleUnit {
    Degrees,
    Radians,
}

/// How a blocking motion primitive ended.
///
/// None of these are failures: a timed-out primitive has done its best and
/// the caller's next instruction still runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionOutcome {
    /// The controller reached its stop threshold (or the path's end).
    Converged,
    /// The time budget expired before convergence.
    TimedOut,
    /// An external stop request was observed mid-primitive.
    Cancelled,
}

impl MotionOutcome {
    pub fn is_cancelled(self) -> bool {
        matches!(self, MotionOutcome::Cancelled)
    }
}

/// Global error type spanning hardware faults, missing sensor data and
/// invalid configuration.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CrawlerError {
    #[error("Hardware Fault on {component}: {details}")]
    HardwareFault { component: String, details: String },

    /// Recoverable: the control loop skips the tick and retries.
    #[error("Sensor Unavailable: {sensor}")]
    SensorUnavailable { sensor: String },

    /// Raised by a marker or recipe action to request a graceful stop.
    #[error("Interrupted: {0}")]
    Interrupted(String),

    #[error("Invalid Configuration: {0}")]
    Config(String),
}

impl CrawlerError {
    /// `true` for errors a control loop should absorb by skipping one tick.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CrawlerError::SensorUnavailable { .. })
    }
}
