//! Generic `Motor` trait for the four mecanum drive wheels.
//!
//! Drivers implement this trait and register themselves with a
//! [`Drivetrain`][crate::drivetrain::Drivetrain]. The engine only ever
//! writes powers; it never reads a motor back.

use crawler_types::{CrawlerError, WheelId};

/// What a motor does while commanded to zero power.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroPowerBehavior {
    /// Short the windings and actively resist motion.
    Brake,
    /// Let the wheel coast.
    Float,
}

/// Logical spin direction relative to the motor's wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    /// Positive power spins the shaft backwards. Used on the right side so
    /// that positive power moves every wheel's contact patch forward.
    Reverse,
}

/// A drive wheel accepting a signed power command.
pub trait Motor: Send {
    /// The wheel slot this motor drives.
    fn wheel(&self) -> WheelId;

    /// Command `power` in `[-1, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError::HardwareFault`] if the command cannot be
    /// delivered to the motor controller.
    fn set_power(&mut self, power: f64) -> Result<(), CrawlerError>;

    fn set_zero_power_behavior(&mut self, behavior: ZeroPowerBehavior)
    -> Result<(), CrawlerError>;

    fn set_direction(&mut self, direction: Direction) -> Result<(), CrawlerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal in-process motor used only for tests.
    struct MockMotor {
        wheel: WheelId,
        power: f64,
        behavior: ZeroPowerBehavior,
        direction: Direction,
    }

    impl Motor for MockMotor {
        fn wheel(&self) -> WheelId {
            self.wheel
        }

        fn set_power(&mut self, power: f64) -> Result<(), CrawlerError> {
            if !(-1.0..=1.0).contains(&power) {
                return Err(CrawlerError::HardwareFault {
                    component: self.wheel.to_string(),
                    details: format!("power {power} out of range"),
                });
            }
            self.power = power;
            Ok(())
        }

        fn set_zero_power_behavior(
            &mut self,
            behavior: ZeroPowerBehavior,
        ) -> Result<(), CrawlerError> {
            self.behavior = behavior;
            Ok(())
        }

        fn set_direction(&mut self, direction: Direction) -> Result<(), CrawlerError> {
            self.direction = direction;
            Ok(())
        }
    }

    #[test]
    fn mock_motor_records_commands() {
        let mut m = MockMotor {
            wheel: WheelId::BackRight,
            power: 0.0,
            behavior: ZeroPowerBehavior::Float,
            direction: Direction::Forward,
        };
        assert_eq!(m.wheel(), WheelId::BackRight);

        m.set_power(-0.4).unwrap();
        m.set_zero_power_behavior(ZeroPowerBehavior::Brake).unwrap();
        m.set_direction(Direction::Reverse).unwrap();
        assert!((m.power + 0.4).abs() < f64::EPSILON);
        assert_eq!(m.behavior, ZeroPowerBehavior::Brake);
        assert_eq!(m.direction, Direction::Reverse);
    }

    #[test]
    fn out_of_range_power_is_a_hardware_fault() {
        let mut m = MockMotor {
            wheel: WheelId::FrontLeft,
            power: 0.0,
            behavior: ZeroPowerBehavior::Float,
            direction: Direction::Forward,
        };
        let err = m.set_power(1.5).unwrap_err();
        assert!(matches!(err, CrawlerError::HardwareFault { .. }));
        assert_eq!(m.power, 0.0);
    }
}
