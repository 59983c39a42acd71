//! In-process kinematic plant for running the control loops without a robot.
//!
//! [`SimPlant`] holds the true pose of a simulated mecanum base together
//! with its commanded wheel powers and raw odometry counts. The simulated
//! drivers ([`SimMotor`], [`SimEncoder`], [`SimImu`]) all share one plant
//! and advance it by real elapsed time whenever a sensor is read, so a
//! blocking control loop sees its own commands take effect tick by tick.
//!
//! # Example
//!
//! ```rust
//! use crawler_hal::sim::{PlantParams, SimPlant};
//!
//! let plant = SimPlant::new(PlantParams::default());
//! plant.set_pose(0.2, -0.1, 0.0);
//! let pose = plant.pose();
//! assert!((pose.x - 0.2).abs() < 1e-12);
//! ```

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use crawler_geometry::Pose;
use crawler_types::{AngleUnit, CrawlerError, WheelId, WheelPowers};

use crate::encoder::{Encoder, EncoderId};
use crate::imu::HeadingSensor;
use crate::motor::{Direction, Motor, ZeroPowerBehavior};

// ────────────────────────────────────────────────────────────────────────────
// Plant model
// ────────────────────────────────────────────────────────────────────────────

/// Physical constants of the simulated base.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlantParams {
    /// Ground speed at full forward power, m/s.
    pub max_speed_mps: f64,
    /// Yaw rate at full turn power, rad/s.
    pub max_turn_rate: f64,
    pub ticks_per_meter: f64,
    pub track_width_m: f64,
    pub center_wheel_offset_m: f64,
}

impl Default for PlantParams {
    fn default() -> Self {
        Self {
            max_speed_mps: 1.5,
            max_turn_rate: 4.0,
            ticks_per_meter: 2000.0 / (std::f64::consts::PI * 0.048),
            track_width_m: 0.30,
            center_wheel_offset_m: 0.0,
        }
    }
}

#[derive(Debug)]
struct PlantState {
    params: PlantParams,
    x: f64,
    y: f64,
    heading: f64,
    yaw_offset: f64,
    powers: WheelPowers,
    behaviors: [Option<ZeroPowerBehavior>; 4],
    directions: [Option<Direction>; 4],
    ticks: [f64; 3],
    stalled: [bool; 3],
    unavailable_reads: u32,
    frozen: bool,
    last_update: Instant,
}

fn wheel_index(wheel: WheelId) -> usize {
    match wheel {
        WheelId::FrontLeft => 0,
        WheelId::FrontRight => 1,
        WheelId::BackLeft => 2,
        WheelId::BackRight => 3,
    }
}

fn pod_index(id: EncoderId) -> usize {
    match id {
        EncoderId::Left => 0,
        EncoderId::Right => 1,
        EncoderId::Center => 2,
    }
}

impl PlantState {
    fn new(params: PlantParams) -> Self {
        Self {
            params,
            x: 0.0,
            y: 0.0,
            heading: 0.0,
            yaw_offset: 0.0,
            powers: WheelPowers::ZERO,
            behaviors: [None; 4],
            directions: [None; 4],
            ticks: [0.0; 3],
            stalled: [false; 3],
            unavailable_reads: 0,
            frozen: false,
            last_update: Instant::now(),
        }
    }

    /// Integrate the commanded wheel powers over the time since the last
    /// update.
    fn advance(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_update).as_secs_f64();
        self.last_update = now;
        if self.frozen || dt <= 0.0 {
            return;
        }

        let p = self.powers;
        let forward = (p.front_left + p.front_right + p.back_left + p.back_right) / 4.0;
        let strafe = (p.front_left - p.front_right - p.back_left + p.back_right) / 4.0;
        let turn_cw = (p.front_left - p.front_right + p.back_left - p.back_right) / 4.0;

        let d_forward = forward * self.params.max_speed_mps * dt;
        let d_strafe = strafe * self.params.max_speed_mps * dt;
        let d_theta = -turn_cw * self.params.max_turn_rate * dt;

        let mid = self.heading + d_theta / 2.0;
        let (sin, cos) = mid.sin_cos();
        self.x += d_forward * cos - d_strafe * sin;
        self.y += d_forward * sin + d_strafe * cos;
        self.heading += d_theta;

        let tpm = self.params.ticks_per_meter;
        let half_track = self.params.track_width_m / 2.0;
        let deltas = [
            (d_forward - d_theta * half_track) * tpm,
            (d_forward + d_theta * half_track) * tpm,
            (d_strafe + d_theta * self.params.center_wheel_offset_m) * tpm,
        ];
        for (i, delta) in deltas.into_iter().enumerate() {
            if !self.stalled[i] {
                self.ticks[i] += delta;
            }
        }
    }

    fn take_unavailable(&mut self) -> bool {
        if self.unavailable_reads > 0 {
            self.unavailable_reads -= 1;
            true
        } else {
            false
        }
    }
}

/// Shared handle to the simulated robot. Cloning is cheap and every clone
/// sees the same state.
#[derive(Debug, Clone)]
pub struct SimPlant {
    state: Arc<Mutex<PlantState>>,
}

impl SimPlant {
    pub fn new(params: PlantParams) -> Self {
        Self {
            state: Arc::new(Mutex::new(PlantState::new(params))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PlantState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn params(&self) -> PlantParams {
        self.lock().params
    }

    /// True field pose, after integrating up to now.
    pub fn pose(&self) -> Pose {
        let mut s = self.lock();
        s.advance();
        Pose::new(s.x, s.y, s.heading)
    }

    /// Teleport the robot. Encoder counts are left untouched.
    pub fn set_pose(&self, x: f64, y: f64, heading: f64) {
        let mut s = self.lock();
        s.advance();
        s.x = x;
        s.y = y;
        s.heading = heading;
    }

    /// Overwrite the raw left, right and center counts.
    pub fn set_encoder_ticks(&self, left: f64, right: f64, center: f64) {
        let mut s = self.lock();
        s.advance();
        s.ticks = [left, right, center];
    }

    /// Powers most recently written by the simulated motors.
    pub fn wheel_powers(&self) -> WheelPowers {
        self.lock().powers
    }

    pub fn zero_power_behavior(&self, wheel: WheelId) -> Option<ZeroPowerBehavior> {
        self.lock().behaviors[wheel_index(wheel)]
    }

    pub fn direction(&self, wheel: WheelId) -> Option<Direction> {
        self.lock().directions[wheel_index(wheel)]
    }

    /// Stop (or resume) counting on one pod, as if its wheel lost contact.
    pub fn set_stalled(&self, id: EncoderId, stalled: bool) {
        let mut s = self.lock();
        s.advance();
        s.stalled[pod_index(id)] = stalled;
    }

    /// Stall every pod.
    pub fn stall_all_encoders(&self) {
        for id in [EncoderId::Left, EncoderId::Right, EncoderId::Center] {
            self.set_stalled(id, true);
        }
    }

    /// Make the next `reads` sensor reads fail with
    /// [`CrawlerError::SensorUnavailable`].
    pub fn fail_next_reads(&self, reads: u32) {
        self.lock().unavailable_reads = reads;
    }

    /// Hold the robot in place regardless of commanded power.
    pub fn set_frozen(&self, frozen: bool) {
        let mut s = self.lock();
        s.advance();
        s.frozen = frozen;
    }

    fn set_power(&self, wheel: WheelId, power: f64) {
        let mut s = self.lock();
        s.advance();
        match wheel {
            WheelId::FrontLeft => s.powers.front_left = power,
            WheelId::FrontRight => s.powers.front_right = power,
            WheelId::BackLeft => s.powers.back_left = power,
            WheelId::BackRight => s.powers.back_right = power,
        }
    }

    fn read_ticks(&self, id: EncoderId) -> Result<f64, CrawlerError> {
        let mut s = self.lock();
        if s.take_unavailable() {
            return Err(CrawlerError::SensorUnavailable {
                sensor: id.to_string(),
            });
        }
        s.advance();
        Ok(s.ticks[pod_index(id)])
    }

    fn read_yaw(&self) -> Result<f64, CrawlerError> {
        let mut s = self.lock();
        if s.take_unavailable() {
            return Err(CrawlerError::SensorUnavailable {
                sensor: "imu".to_string(),
            });
        }
        s.advance();
        Ok(s.heading - s.yaw_offset)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Simulated drivers
// ────────────────────────────────────────────────────────────────────────────

/// A simulated drive motor. Power is taken as already direction-corrected:
/// positive always pushes its wheel forward.
pub struct SimMotor {
    wheel: WheelId,
    plant: SimPlant,
}

impl SimMotor {
    pub fn new(wheel: WheelId, plant: &SimPlant) -> Box<Self> {
        Box::new(Self {
            wheel,
            plant: plant.clone(),
        })
    }
}

impl Motor for SimMotor {
    fn wheel(&self) -> WheelId {
        self.wheel
    }

    fn set_power(&mut self, power: f64) -> Result<(), CrawlerError> {
        if !power.is_finite() {
            return Err(CrawlerError::HardwareFault {
                component: self.wheel.to_string(),
                details: format!("non-finite power {power}"),
            });
        }
        self.plant.set_power(self.wheel, power.clamp(-1.0, 1.0));
        Ok(())
    }

    fn set_zero_power_behavior(&mut self, behavior: ZeroPowerBehavior) -> Result<(), CrawlerError> {
        self.plant.lock().behaviors[wheel_index(self.wheel)] = Some(behavior);
        Ok(())
    }

    fn set_direction(&mut self, direction: Direction) -> Result<(), CrawlerError> {
        self.plant.lock().directions[wheel_index(self.wheel)] = Some(direction);
        Ok(())
    }
}

/// A simulated odometry pod.
pub struct SimEncoder {
    id: EncoderId,
    plant: SimPlant,
}

impl SimEncoder {
    pub fn new(id: EncoderId, plant: &SimPlant) -> Box<Self> {
        Box::new(Self {
            id,
            plant: plant.clone(),
        })
    }
}

impl Encoder for SimEncoder {
    fn id(&self) -> EncoderId {
        self.id
    }

    fn ticks(&self) -> Result<f64, CrawlerError> {
        self.plant.read_ticks(self.id)
    }

    fn reset(&mut self) -> Result<(), CrawlerError> {
        let mut s = self.plant.lock();
        s.advance();
        s.ticks[pod_index(self.id)] = 0.0;
        Ok(())
    }
}

/// A simulated IMU reporting the plant's true heading relative to its last
/// reset.
pub struct SimImu {
    plant: SimPlant,
}

impl SimImu {
    pub fn new(plant: &SimPlant) -> Box<Self> {
        Box::new(Self {
            plant: plant.clone(),
        })
    }
}

impl HeadingSensor for SimImu {
    fn yaw(&self, unit: AngleUnit) -> Result<f64, CrawlerError> {
        let rad = crawler_geometry::normalize_radians(self.plant.read_yaw()?);
        Ok(match unit {
            AngleUnit::Radians => rad,
            AngleUnit::Degrees => rad.to_degrees(),
        })
    }

    fn reset_yaw(&mut self) -> Result<(), CrawlerError> {
        let mut s = self.plant.lock();
        s.advance();
        s.yaw_offset = s.heading;
        Ok(())
    }
}
