//! [`MotionEngine`] – blocking robot-oriented motion primitives.
//!
//! Every primitive runs the same polling loop until its axis converges, the
//! time budget expires or the [`CancelToken`] is raised:
//!
//! 1. **Guard** – a raised token ends the primitive as
//!    [`MotionOutcome::Cancelled`], an expired deadline as
//!    [`MotionOutcome::TimedOut`].
//! 2. **Sample** – read the encoders and IMU. A
//!    [`CrawlerError::SensorUnavailable`] skips the tick without touching the
//!    motors.
//! 3. **Step** – advance the axis PID; a converged axis ends the loop
//!    without a final write.
//! 4. **Act** – mix and write the wheel powers, then sleep one loop period.
//!
//! On every exit the drivetrain is commanded to zero power and held for the
//! settle delay before the outcome is returned.
//!
//! # Example
//!
//! ```rust,no_run
//! use crawler_hal::SimRobot;
//! use crawler_runtime::MotionEngine;
//! use crawler_types::CrawlerConfig;
//!
//! let config = CrawlerConfig::default();
//! let (hardware, _plant) = SimRobot::builder().with_config(&config).build();
//! let mut engine = MotionEngine::new(hardware, config)?;
//! engine.prepare()?;
//! engine.drive_distance(0.5, 0.0)?;
//! engine.turn_to_heading(90.0)?;
//! # Ok::<(), crawler_types::CrawlerError>(())
//! ```

use std::thread;

use crawler_geometry::Pose;
use crawler_hal::{AxisPid, AxisState, Hardware};
use crawler_types::config::LocalizerKind;
use crawler_types::{CrawlerConfig, CrawlerError, MotionOutcome};
use tracing::{debug, info, instrument, trace, warn};

use crate::cancel::CancelToken;
use crate::deadline::Deadline;
use crate::follower::{PathFollower, PathMarker};
use crate::localizer::{EncoderLocalizer, TrackingOdometry};

/// What one loop iteration decided.
enum Tick {
    Converged,
    Command { forward: f64, strafe: f64, turn: f64 },
}

fn sign(reversed: bool) -> f64 {
    if reversed { -1.0 } else { 1.0 }
}

/// Owns the robot hardware and runs motion primitives against it.
pub struct MotionEngine {
    hardware: Hardware,
    config: CrawlerConfig,
    cancel: CancelToken,
}

impl MotionEngine {
    /// Build an engine around `hardware`.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError::Config`] if `config` fails validation.
    pub fn new(hardware: Hardware, config: CrawlerConfig) -> Result<Self, CrawlerError> {
        config.validate()?;
        Ok(Self {
            hardware,
            config,
            cancel: CancelToken::new(),
        })
    }

    /// Share an externally owned stop token, e.g. one raised by a Ctrl-C
    /// handler.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    pub fn hardware(&self) -> &Hardware {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut Hardware {
        &mut self.hardware
    }

    /// Configure the motors and zero the odometry and heading.
    pub fn prepare(&mut self) -> Result<(), CrawlerError> {
        self.hardware.prepare()?;
        info!("hardware prepared");
        Ok(())
    }

    /// Command zero power to every wheel.
    pub fn stop(&mut self) -> Result<(), CrawlerError> {
        self.hardware.drivetrain.stop()
    }

    // ── Primitives ──────────────────────────────────────────────────────────

    /// Drive `meters` along the robot's forward axis while holding
    /// `heading_deg`.
    ///
    /// Distance is measured from the parallel pods' average at entry; the
    /// counters are not reset.
    #[instrument(skip(self))]
    pub fn drive_distance(
        &mut self,
        meters: f64,
        heading_deg: f64,
    ) -> Result<MotionOutcome, CrawlerError> {
        let tpm = self.config.ticks_per_meter();
        let mut pid = AxisPid::distance(
            &self.config.drive,
            tpm,
            self.config.power_clamp,
            self.config.min_power,
        );
        pid.set_setpoint(meters * tpm);

        let mut steer = AxisPid::steering(self.config.steer_gain);
        steer.set_setpoint(heading_deg);

        let parallel_sign = sign(self.config.odometry.parallel_reversed);
        let mut baseline: Option<f64> = None;

        info!(target_ticks = pid.setpoint(), "drive started");
        self.control_loop("drive", &mut pid, |hw, pid| {
            let position = hw.pods.parallel_average()? * parallel_sign;
            let yaw = hw.yaw_degrees()?;
            let start = *baseline.get_or_insert(position);

            let power = pid.step(position - start);
            if pid.state() == AxisState::Converged {
                return Ok(Tick::Converged);
            }
            Ok(Tick::Command {
                forward: power,
                strafe: 0.0,
                turn: -steer.step(yaw),
            })
        })
    }

    /// Strafe `meters` along the robot's lateral axis while holding a
    /// heading.
    ///
    /// With `mirror_strafe_heading` set the heading hold targets
    /// `-heading_deg`, reproducing the reference robot's negated IMU reading;
    /// only `0` behaves identically in both conventions.
    #[instrument(skip(self))]
    pub fn strafe_distance(
        &mut self,
        meters: f64,
        heading_deg: f64,
    ) -> Result<MotionOutcome, CrawlerError> {
        let tpm = self.config.ticks_per_meter();
        let mut pid = AxisPid::distance(
            &self.config.strafe,
            tpm,
            self.config.power_clamp,
            self.config.min_power,
        );
        pid.set_setpoint(meters * tpm);

        let mut steer = AxisPid::steering(self.config.steer_gain);
        steer.set_setpoint(if self.config.mirror_strafe_heading {
            -heading_deg
        } else {
            heading_deg
        });

        let lateral_sign = sign(self.config.odometry.lateral_reversed);
        let mut baseline: Option<f64> = None;

        info!(target_ticks = pid.setpoint(), "strafe started");
        self.control_loop("strafe", &mut pid, |hw, pid| {
            let position = hw.pods.lateral()? * lateral_sign;
            let yaw = hw.yaw_degrees()?;
            let start = *baseline.get_or_insert(position);

            let power = pid.step(position - start);
            if pid.state() == AxisState::Converged {
                return Ok(Tick::Converged);
            }
            Ok(Tick::Command {
                forward: 0.0,
                strafe: power,
                turn: -steer.step(yaw),
            })
        })
    }

    /// Rotate in place to the absolute IMU heading `heading_deg`, the short
    /// way round.
    #[instrument(skip(self))]
    pub fn turn_to_heading(&mut self, heading_deg: f64) -> Result<MotionOutcome, CrawlerError> {
        let mut pid = AxisPid::heading(&self.config.turn);
        pid.set_setpoint(heading_deg);

        info!("turn started");
        self.control_loop("turn", &mut pid, |hw, pid| {
            let yaw = hw.yaw_degrees()?;
            let power = pid.step(yaw);
            if pid.state() == AxisState::Converged {
                return Ok(Tick::Converged);
            }
            Ok(Tick::Command {
                forward: 0.0,
                strafe: 0.0,
                turn: -power,
            })
        })
    }

    /// Follow `path` with the pure-pursuit follower, firing `markers` along
    /// the way.
    ///
    /// The pose comes from the localizer selected by `follower.localizer`.
    /// Either way path coordinates are in the frame fixed by
    /// [`prepare`](Self::prepare), not relative to the current position.
    #[instrument(skip_all, fields(waypoints = path.len()))]
    pub fn follow_path(
        &mut self,
        path: &[Pose],
        markers: &mut [PathMarker],
    ) -> Result<MotionOutcome, CrawlerError> {
        let follower = PathFollower::new(&self.config, self.cancel.clone());
        let Hardware {
            drivetrain,
            pods,
            imu,
        } = &mut self.hardware;

        let result = match self.config.follower.localizer {
            LocalizerKind::Encoder => {
                let mut source = EncoderLocalizer::new(pods, &**imu, &self.config.odometry);
                follower.run_path(&mut source, drivetrain, path, markers)
            }
            LocalizerKind::Tracking => {
                let mut source = TrackingOdometry::from_counters(pods, &self.config.odometry);
                follower.run_path(&mut source, drivetrain, path, markers)
            }
        };
        if !path.is_empty() {
            self.settle();
        }
        result
    }

    // ── Loop machinery ──────────────────────────────────────────────────────

    fn control_loop<F>(
        &mut self,
        label: &'static str,
        pid: &mut AxisPid,
        mut tick: F,
    ) -> Result<MotionOutcome, CrawlerError>
    where
        F: FnMut(&Hardware, &mut AxisPid) -> Result<Tick, CrawlerError>,
    {
        let deadline = Deadline::after(self.config.timeout());
        let loop_period = self.config.loop_period();

        let result = loop {
            if self.cancel.is_cancelled() {
                info!(label, "cancelled");
                break Ok(MotionOutcome::Cancelled);
            }
            if deadline.expired() {
                pid.mark_timed_out();
                warn!(label, elapsed = ?deadline.elapsed(), integral = pid.integral(), "timed out");
                break Ok(MotionOutcome::TimedOut);
            }

            match tick(&self.hardware, pid) {
                Ok(Tick::Converged) => {
                    info!(label, elapsed = ?deadline.elapsed(), "converged");
                    break Ok(MotionOutcome::Converged);
                }
                Ok(Tick::Command {
                    forward,
                    strafe,
                    turn,
                }) => {
                    trace!(label, forward, strafe, turn, "axis command");
                    if let Err(e) = self
                        .hardware
                        .drivetrain
                        .drive_robot_relative(forward, strafe, turn)
                    {
                        break Err(e);
                    }
                }
                Err(e) if e.is_recoverable() => {
                    debug!(label, error = %e, "sensor unavailable; skipping tick");
                }
                Err(e) => break Err(e),
            }

            if !loop_period.is_zero() {
                thread::sleep(loop_period);
            }
        };

        let stopped = self.hardware.drivetrain.stop();
        self.settle();
        let outcome = result?;
        stopped?;
        Ok(outcome)
    }

    fn settle(&self) {
        let delay = self.config.settle_delay();
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}
