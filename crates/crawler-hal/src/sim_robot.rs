//! [`SimRobot`] – builds a complete simulated [`Hardware`] bundle.
//!
//! Every device is backed by one shared [`SimPlant`], which is handed back
//! alongside the bundle so tests can inspect the true pose, stall encoders
//! or inject sensor dropouts while the engine runs.
//!
//! # Example
//!
//! ```rust
//! use crawler_hal::SimRobot;
//!
//! let (mut hw, plant) = SimRobot::builder().max_speed(2.0).build();
//! hw.prepare().unwrap();
//! hw.drivetrain.drive_robot_relative(0.5, 0.0, 0.0).unwrap();
//! assert_eq!(plant.wheel_powers().front_left, 0.5);
//! ```

use crawler_types::{CrawlerConfig, WheelId};

use crate::drivetrain::Drivetrain;
use crate::encoder::EncoderId;
use crate::hardware::{Hardware, OdometryPods};
use crate::sim::{PlantParams, SimEncoder, SimImu, SimMotor, SimPlant};

/// Builder for a simulated robot.
#[derive(Debug, Clone, Default)]
pub struct SimRobot {
    params: PlantParams,
}

impl SimRobot {
    pub fn builder() -> Self {
        Self::default()
    }

    /// Match the plant's odometry geometry to `config`.
    pub fn with_config(mut self, config: &CrawlerConfig) -> Self {
        self.params.ticks_per_meter = config.ticks_per_meter();
        self.params.track_width_m = config.odometry.track_width_m;
        self.params.center_wheel_offset_m = config.odometry.center_wheel_offset_m;
        self
    }

    pub fn max_speed(mut self, mps: f64) -> Self {
        self.params.max_speed_mps = mps;
        self
    }

    pub fn max_turn_rate(mut self, rad_per_sec: f64) -> Self {
        self.params.max_turn_rate = rad_per_sec;
        self
    }

    pub fn params(&self) -> PlantParams {
        self.params
    }

    /// Consume the builder and return the hardware bundle plus a handle to
    /// the plant behind it.
    pub fn build(self) -> (Hardware, SimPlant) {
        let plant = SimPlant::new(self.params);

        let mut drivetrain = Drivetrain::new();
        for wheel in WheelId::ALL {
            drivetrain.register_motor(SimMotor::new(wheel, &plant));
        }
        let pods = OdometryPods {
            left: SimEncoder::new(EncoderId::Left, &plant),
            right: SimEncoder::new(EncoderId::Right, &plant),
            center: SimEncoder::new(EncoderId::Center, &plant),
        };
        let hardware = Hardware::new(drivetrain, pods, SimImu::new(&plant));
        (hardware, plant)
    }
}
