//! [`Drivetrain`] – per-wheel motor registry and mecanum mixing.
//!
//! # Mixing
//!
//! A robot-relative command `(forward, strafe, turn)` is mapped onto the four
//! wheels of an X-configured mecanum base:
//!
//! | wheel       | power                         |
//! |-------------|-------------------------------|
//! | front-left  | `forward + strafe + turn`     |
//! | front-right | `forward - strafe - turn`     |
//! | back-left   | `forward - strafe + turn`     |
//! | back-right  | `forward + strafe - turn`     |
//!
//! Positive `turn` drives the left side forward (clockwise from above). If
//! any wheel exceeds 1 in magnitude all four are rescaled together so the
//! wheel ratios, and therefore the motion direction, are preserved.

use std::collections::HashMap;

use crawler_types::{CrawlerError, WheelId, WheelPowers};
use tracing::trace;

use crate::motor::{Direction, Motor, ZeroPowerBehavior};

/// Mix a robot-relative command into normalized wheel powers.
///
/// ```rust
/// use crawler_hal::mecanum_mix;
///
/// let p = mecanum_mix(0.0, 0.0, 0.3);
/// assert_eq!((p.front_left, p.front_right), (0.3, -0.3));
/// assert_eq!((p.back_left, p.back_right), (0.3, -0.3));
/// ```
pub fn mecanum_mix(forward: f64, strafe: f64, turn: f64) -> WheelPowers {
    WheelPowers::new(
        forward + strafe + turn,
        forward - strafe - turn,
        forward - strafe + turn,
        forward + strafe - turn,
    )
    .normalized()
}

/// Rotate a field-relative `(forward, strafe)` vector into the robot frame
/// for a robot whose heading is `heading` radians (counter-clockwise).
pub fn field_to_robot(forward: f64, strafe: f64, heading: f64) -> (f64, f64) {
    let (sin, cos) = heading.sin_cos();
    (forward * cos + strafe * sin, -forward * sin + strafe * cos)
}

/// Four-wheel drive base.
///
/// Register one motor per [`WheelId`], then command it through
/// [`apply`][Self::apply] or one of the drive helpers. Every command writes
/// all four wheels.
#[derive(Default)]
pub struct Drivetrain {
    motors: HashMap<WheelId, Box<dyn Motor>>,
    last_command: WheelPowers,
}

impl Drivetrain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a motor in the slot it reports. Any previously registered
    /// motor for the same wheel is replaced.
    pub fn register_motor(&mut self, motor: Box<dyn Motor>) {
        self.motors.insert(motor.wheel(), motor);
    }

    /// `true` once all four wheels have a motor.
    pub fn is_complete(&self) -> bool {
        WheelId::ALL.iter().all(|w| self.motors.contains_key(w))
    }

    /// Most recent powers successfully written by this drivetrain.
    pub fn last_command(&self) -> WheelPowers {
        self.last_command
    }

    /// Write `powers` to every wheel after joint normalization.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError::HardwareFault`] when a wheel has no registered
    /// motor or the motor rejects the command.
    pub fn apply(&mut self, powers: WheelPowers) -> Result<WheelPowers, CrawlerError> {
        let powers = powers.normalized();
        for wheel in WheelId::ALL {
            self.motor_mut(wheel)?.set_power(powers.get(wheel))?;
        }
        trace!(
            fl = powers.front_left,
            fr = powers.front_right,
            bl = powers.back_left,
            br = powers.back_right,
            "wheel powers"
        );
        self.last_command = powers;
        Ok(powers)
    }

    /// Robot-relative drive; see the module docs for the mixing table.
    pub fn drive_robot_relative(
        &mut self,
        forward: f64,
        strafe: f64,
        turn: f64,
    ) -> Result<WheelPowers, CrawlerError> {
        self.apply(mecanum_mix(forward, strafe, turn))
    }

    /// Field-relative drive.
    ///
    /// `forward`/`strafe` are along the field x/y axes and `turn_ccw` is a
    /// counter-clockwise rotation rate; `heading` is the robot's current
    /// heading in radians.
    pub fn drive_field_relative(
        &mut self,
        forward: f64,
        strafe: f64,
        turn_ccw: f64,
        heading: f64,
    ) -> Result<WheelPowers, CrawlerError> {
        let (robot_forward, robot_strafe) = field_to_robot(forward, strafe, heading);
        self.drive_robot_relative(robot_forward, robot_strafe, -turn_ccw)
    }

    /// Command zero power to all four wheels.
    pub fn stop(&mut self) -> Result<(), CrawlerError> {
        self.apply(WheelPowers::ZERO).map(|_| ())
    }

    /// Brake on zero for every wheel and reverse the right side, so positive
    /// power moves each wheel forward.
    pub fn configure_motors(&mut self) -> Result<(), CrawlerError> {
        for wheel in WheelId::ALL {
            let motor = self.motor_mut(wheel)?;
            motor.set_zero_power_behavior(ZeroPowerBehavior::Brake)?;
            let direction = if wheel.is_left() {
                Direction::Forward
            } else {
                Direction::Reverse
            };
            motor.set_direction(direction)?;
        }
        Ok(())
    }

    fn motor_mut(&mut self, wheel: WheelId) -> Result<&mut Box<dyn Motor>, CrawlerError> {
        self.motors
            .get_mut(&wheel)
            .ok_or_else(|| CrawlerError::HardwareFault {
                component: wheel.to_string(),
                details: format!("motor '{wheel}' is not registered"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    // ------------------------------------------------------------------
    // Test doubles
    // ------------------------------------------------------------------

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Recorded {
        power: f64,
        behavior: Option<ZeroPowerBehavior>,
        direction: Option<Direction>,
    }

    type Log = Arc<Mutex<HashMap<WheelId, Recorded>>>;

    struct RecordingMotor {
        wheel: WheelId,
        log: Log,
    }

    impl RecordingMotor {
        fn new(wheel: WheelId, log: &Log) -> Box<Self> {
            log.lock().unwrap().insert(
                wheel,
                Recorded {
                    power: 0.0,
                    behavior: None,
                    direction: None,
                },
            );
            Box::new(Self {
                wheel,
                log: Arc::clone(log),
            })
        }
    }

    impl Motor for RecordingMotor {
        fn wheel(&self) -> WheelId {
            self.wheel
        }
        fn set_power(&mut self, power: f64) -> Result<(), CrawlerError> {
            self.log.lock().unwrap().get_mut(&self.wheel).unwrap().power = power;
            Ok(())
        }
        fn set_zero_power_behavior(
            &mut self,
            behavior: ZeroPowerBehavior,
        ) -> Result<(), CrawlerError> {
            self.log.lock().unwrap().get_mut(&self.wheel).unwrap().behavior = Some(behavior);
            Ok(())
        }
        fn set_direction(&mut self, direction: Direction) -> Result<(), CrawlerError> {
            self.log.lock().unwrap().get_mut(&self.wheel).unwrap().direction = Some(direction);
            Ok(())
        }
    }

    fn full_drivetrain() -> (Drivetrain, Log) {
        let log: Log = Arc::default();
        let mut dt = Drivetrain::new();
        for wheel in WheelId::ALL {
            dt.register_motor(RecordingMotor::new(wheel, &log));
        }
        (dt, log)
    }

    fn power(log: &Log, wheel: WheelId) -> f64 {
        log.lock().unwrap()[&wheel].power
    }

    // ------------------------------------------------------------------
    // Tests
    // ------------------------------------------------------------------

    #[test]
    fn pure_forward_reaches_every_wheel() {
        let (mut dt, log) = full_drivetrain();
        dt.drive_robot_relative(0.5, 0.0, 0.0).unwrap();
        for wheel in WheelId::ALL {
            assert!((power(&log, wheel) - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn pure_steer_splits_left_and_right() {
        let (mut dt, log) = full_drivetrain();
        dt.drive_robot_relative(0.0, 0.0, 0.3).unwrap();
        for wheel in WheelId::ALL {
            let expected = if wheel.is_left() { 0.3 } else { -0.3 };
            assert!((power(&log, wheel) - expected).abs() < 1e-12, "{wheel}");
        }
    }

    #[test]
    fn pure_strafe_alternates_diagonals() {
        let p = mecanum_mix(0.0, 0.4, 0.0);
        assert_eq!(p, WheelPowers::new(0.4, -0.4, -0.4, 0.4));
    }

    #[test]
    fn oversaturated_command_is_rescaled_jointly() {
        let p = mecanum_mix(0.7, 0.0, 0.6);
        // raw: fl 1.3, fr 0.1, bl 1.3, br 0.1
        assert!((p.max_magnitude() - 1.0).abs() < 1e-12);
        assert!((p.front_left - 1.0).abs() < 1e-12);
        assert!((p.front_right - 0.1 / 1.3).abs() < 1e-12);
    }

    #[test]
    fn field_relative_matches_robot_relative_at_zero_heading() {
        assert_eq!(
            mecanum_mix(0.3, 0.2, -0.1),
            {
                let (f, s) = field_to_robot(0.3, 0.2, 0.0);
                mecanum_mix(f, s, -0.1)
            }
        );
    }

    #[test]
    fn field_forward_becomes_right_strafe_when_facing_left() {
        // Facing +y, a +x field command is to the robot's right.
        let (f, s) = field_to_robot(0.5, 0.0, std::f64::consts::FRAC_PI_2);
        assert!(f.abs() < 1e-12);
        assert!((s + 0.5).abs() < 1e-12);
    }

    #[test]
    fn stop_zeroes_every_wheel() {
        let (mut dt, log) = full_drivetrain();
        dt.drive_robot_relative(0.5, 0.1, 0.2).unwrap();
        dt.stop().unwrap();
        assert!(dt.last_command().is_zero());
        for wheel in WheelId::ALL {
            assert_eq!(power(&log, wheel), 0.0);
        }
    }

    #[test]
    fn configure_brakes_and_reverses_right_side() {
        let (mut dt, log) = full_drivetrain();
        dt.configure_motors().unwrap();
        let log = log.lock().unwrap();
        for wheel in WheelId::ALL {
            assert_eq!(log[&wheel].behavior, Some(ZeroPowerBehavior::Brake));
            let expected = if wheel.is_left() {
                Direction::Forward
            } else {
                Direction::Reverse
            };
            assert_eq!(log[&wheel].direction, Some(expected));
        }
    }

    #[test]
    fn missing_motor_is_a_hardware_fault() {
        let log: Log = Arc::default();
        let mut dt = Drivetrain::new();
        dt.register_motor(RecordingMotor::new(WheelId::FrontLeft, &log));
        assert!(!dt.is_complete());
        let err = dt.stop().unwrap_err();
        assert!(matches!(err, CrawlerError::HardwareFault { ref component, .. } if component == "frontRight"));
    }
}
