//! [`Hardware`] – everything a motion engine drives and reads.

use crawler_types::{AngleUnit, CrawlerError};
use tracing::debug;

use crate::drivetrain::Drivetrain;
use crate::encoder::Encoder;
use crate::imu::HeadingSensor;

/// The three dead-wheel odometry pods.
pub struct OdometryPods {
    pub left: Box<dyn Encoder>,
    pub right: Box<dyn Encoder>,
    pub center: Box<dyn Encoder>,
}

impl OdometryPods {
    /// Mean of the two parallel pods, in ticks.
    pub fn parallel_average(&self) -> Result<f64, CrawlerError> {
        Ok((self.left.ticks()? + self.right.ticks()?) / 2.0)
    }

    /// Lateral pod, in ticks.
    pub fn lateral(&self) -> Result<f64, CrawlerError> {
        self.center.ticks()
    }

    pub fn reset(&mut self) -> Result<(), CrawlerError> {
        self.left.reset()?;
        self.right.reset()?;
        self.center.reset()
    }
}

/// Drivetrain, odometry pods and IMU of one robot.
pub struct Hardware {
    pub drivetrain: Drivetrain,
    pub pods: OdometryPods,
    pub imu: Box<dyn HeadingSensor>,
}

impl Hardware {
    pub fn new(drivetrain: Drivetrain, pods: OdometryPods, imu: Box<dyn HeadingSensor>) -> Self {
        Self {
            drivetrain,
            pods,
            imu,
        }
    }

    /// Brake-on-zero and right-side reversal, see
    /// [`Drivetrain::configure_motors`].
    pub fn configure_motors(&mut self) -> Result<(), CrawlerError> {
        self.drivetrain.configure_motors()
    }

    pub fn reset_odometry(&mut self) -> Result<(), CrawlerError> {
        debug!("resetting odometry pods");
        self.pods.reset()
    }

    pub fn reset_heading(&mut self) -> Result<(), CrawlerError> {
        debug!("resetting imu yaw");
        self.imu.reset_yaw()
    }

    /// Current yaw in degrees.
    pub fn yaw_degrees(&self) -> Result<f64, CrawlerError> {
        self.imu.yaw(AngleUnit::Degrees)
    }

    /// Run the pre-start sequence: configure motors, zero the pods and the
    /// heading.
    pub fn prepare(&mut self) -> Result<(), CrawlerError> {
        self.configure_motors()?;
        self.reset_odometry()?;
        self.reset_heading()
    }
}
