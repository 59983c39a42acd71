//! `crawler-hal` – Hardware Abstraction Layer
//!
//! The control loops never talk to a device directly. They see four wheels,
//! three odometry pods and a heading sensor through the traits in this crate,
//! so the same engine runs against the real robot or the in-process plant.
//!
//! # Modules
//!
//! - [`motor`] – [`Motor`][motor::Motor]: one drive wheel accepting a signed
//!   power command.
//! - [`encoder`] – [`Encoder`][encoder::Encoder]: a cumulative tick counter
//!   (dead-wheel odometry pod).
//! - [`imu`] – [`HeadingSensor`][imu::HeadingSensor]: yaw in a caller-chosen
//!   unit.
//! - [`pid`] – [`AxisPid`][pid::AxisPid]: the tick-based axis controller with
//!   integral band, output clamp and minimum-power floor.
//! - [`drivetrain`] – [`Drivetrain`][drivetrain::Drivetrain]: per-wheel motor
//!   registry and the mecanum mixing transform.
//! - [`hardware`] – [`Hardware`][hardware::Hardware]: the full device bundle a
//!   motion engine owns.
//! - [`sim`] – [`SimPlant`][sim::SimPlant]: a shared kinematic model backing
//!   simulated motors, encoders and IMU.
//! - [`sim_robot`] – [`SimRobot`][sim_robot::SimRobot]: builder that wires a
//!   complete simulated [`Hardware`][hardware::Hardware] bundle.

pub mod drivetrain;
pub mod encoder;
pub mod hardware;
pub mod imu;
pub mod motor;
pub mod pid;
pub mod sim;
pub mod sim_robot;

pub use drivetrain::{Drivetrain, mecanum_mix};
pub use encoder::{Encoder, EncoderId};
pub use hardware::{Hardware, OdometryPods};
pub use imu::HeadingSensor;
pub use motor::{Direction, Motor, ZeroPowerBehavior};
pub use pid::{AxisLimits, AxisPid, AxisState, ErrorWrap};
pub use sim::SimPlant;
pub use sim_robot::SimRobot;
