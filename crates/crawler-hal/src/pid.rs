//! Tick-based axis controller shared by the drive, strafe and turn
//! primitives.
//!
//! Unlike a textbook PID this controller is dt-agnostic: the integral is a
//! plain running sum of errors and the derivative is the difference between
//! consecutive errors. The gains in [`AxisGains`] are tuned against that
//! convention at the reference loop rate.
//!
//! Per tick, with `e = setpoint - measurement` (wrapped for heading axes):
//!
//! 1. `derivative = e - last_error` (`last_error` starts at 0).
//! 2. `integral += e` while `|e| < integral_band`, otherwise `integral = 0`;
//!    optionally clamped to `±integral_limit`.
//! 3. `output = kp·e·proportional_scale + ki·integral + kd·derivative`.
//! 4. `output` is clamped to `±output_max`.
//! 5. If `0 < |output| < min_power` while `|e| > stop_threshold`, the
//!    magnitude is raised to `min_power` with the sign kept.
//!
//! # Example
//!
//! ```rust
//! use crawler_hal::pid::{AxisLimits, AxisPid, AxisState};
//! use crawler_types::config::AxisGains;
//!
//! let limits = AxisLimits {
//!     output_max: 0.6,
//!     min_power: 0.15,
//!     integral_band: 5.0,
//!     integral_limit: None,
//!     stop_threshold: 1.0,
//! };
//! let mut pid = AxisPid::new(AxisGains::p(0.03), limits);
//! pid.set_setpoint(90.0);
//!
//! let out = pid.step(0.0);
//! assert!((out - 0.6).abs() < 1e-12); // 0.03 * 90 clamped
//! assert_eq!(pid.state(), AxisState::Running);
//! ```

use crawler_geometry::angle::normalize_degrees;
use crawler_types::config::{AxisGains, DistanceAxisConfig, TurnAxisConfig};

/// How the raw `setpoint - measurement` difference is turned into an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorWrap {
    /// Plain difference (distance axes).
    #[default]
    Linear,
    /// Wrapped into (-180, 180] so the axis turns the short way round.
    Degrees,
}

/// Lifecycle of one axis within a single primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisState {
    #[default]
    Idle,
    Running,
    Converged,
    TimedOut,
}

/// Output shaping and convergence limits, all in the axis' error units
/// except `output_max` and `min_power` which are motor powers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisLimits {
    pub output_max: f64,
    pub min_power: f64,
    pub integral_band: f64,
    pub integral_limit: Option<f64>,
    pub stop_threshold: f64,
}

impl AxisLimits {
    /// No clamp, no floor, no integral, never converges on its own.
    pub fn unbounded() -> Self {
        Self {
            output_max: f64::INFINITY,
            min_power: 0.0,
            integral_band: 0.0,
            integral_limit: None,
            stop_threshold: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AxisPid {
    gains: AxisGains,
    limits: AxisLimits,
    wrap: ErrorWrap,
    proportional_scale: f64,
    setpoint: f64,
    integral: f64,
    last_error: f64,
    state: AxisState,
}

impl AxisPid {
    pub fn new(gains: AxisGains, limits: AxisLimits) -> Self {
        Self {
            gains,
            limits,
            wrap: ErrorWrap::Linear,
            proportional_scale: 1.0,
            setpoint: 0.0,
            integral: 0.0,
            last_error: 0.0,
            state: AxisState::Idle,
        }
    }

    pub fn with_wrap(mut self, wrap: ErrorWrap) -> Self {
        self.wrap = wrap;
        self
    }

    /// Multiply the proportional term only. Distance axes use
    /// `1 / ticks_per_meter` so `kp` reads as power per meter of error.
    pub fn with_proportional_scale(mut self, scale: f64) -> Self {
        self.proportional_scale = scale;
        self
    }

    /// Forward or strafe axis measured in encoder ticks.
    pub fn distance(
        axis: &DistanceAxisConfig,
        ticks_per_meter: f64,
        power_clamp: f64,
        min_power: f64,
    ) -> Self {
        let limits = AxisLimits {
            output_max: power_clamp,
            min_power,
            integral_band: axis.integral_band_m * ticks_per_meter,
            integral_limit: axis.integral_limit,
            stop_threshold: axis.stop_threshold_ticks,
        };
        Self::new(axis.gains, limits).with_proportional_scale(1.0 / ticks_per_meter)
    }

    /// In-place turn axis measured in degrees.
    pub fn heading(axis: &TurnAxisConfig) -> Self {
        let limits = AxisLimits {
            output_max: axis.output_max,
            min_power: axis.min_power,
            integral_band: axis.integral_band_deg,
            integral_limit: None,
            stop_threshold: axis.stop_threshold_deg,
        };
        Self::new(axis.gains, limits).with_wrap(ErrorWrap::Degrees)
    }

    /// Proportional heading hold used as a steering correction while driving
    /// or strafing.
    pub fn steering(steer_gain: f64) -> Self {
        Self::new(AxisGains::p(steer_gain), AxisLimits::unbounded()).with_wrap(ErrorWrap::Degrees)
    }

    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    pub fn state(&self) -> AxisState {
        self.state
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn limits(&self) -> &AxisLimits {
        &self.limits
    }

    /// Error for `measurement` against the current setpoint, wrapped if the
    /// axis is angular. Does not touch controller state.
    pub fn error(&self, measurement: f64) -> f64 {
        let raw = self.setpoint - measurement;
        match self.wrap {
            ErrorWrap::Linear => raw,
            ErrorWrap::Degrees => normalize_degrees(raw),
        }
    }

    pub fn is_within_threshold(&self, error: f64) -> bool {
        error.abs() <= self.limits.stop_threshold
    }

    /// Advance one tick and return the shaped output.
    ///
    /// Moves the axis to [`AxisState::Converged`] when the error is inside
    /// the stop threshold, [`AxisState::Running`] otherwise.
    pub fn step(&mut self, measurement: f64) -> f64 {
        let error = self.error(measurement);
        let derivative = error - self.last_error;

        if error.abs() < self.limits.integral_band {
            self.integral += error;
            if let Some(limit) = self.limits.integral_limit {
                self.integral = self.integral.clamp(-limit, limit);
            }
        } else {
            self.integral = 0.0;
        }

        let raw = self.gains.kp * error * self.proportional_scale
            + self.gains.ki * self.integral
            + self.gains.kd * derivative;
        let mut output = raw.clamp(-self.limits.output_max, self.limits.output_max);

        // Static-friction floor, skipped once converged to avoid bias.
        if output != 0.0
            && output.abs() < self.limits.min_power
            && error.abs() > self.limits.stop_threshold
        {
            output = self.limits.min_power.copysign(output);
        }

        self.last_error = error;
        self.state = if self.is_within_threshold(error) {
            AxisState::Converged
        } else {
            AxisState::Running
        };
        output
    }

    pub fn mark_timed_out(&mut self) {
        self.state = AxisState::TimedOut;
    }

    /// Clear accumulators and return to [`AxisState::Idle`].
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_error = 0.0;
        self.state = AxisState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawler_types::CrawlerConfig;

    fn limits(output_max: f64, min_power: f64, band: f64, stop: f64) -> AxisLimits {
        AxisLimits {
            output_max,
            min_power,
            integral_band: band,
            integral_limit: None,
            stop_threshold: stop,
        }
    }

    #[test]
    fn proportional_only_drives_toward_setpoint() {
        let mut pid = AxisPid::new(AxisGains::p(2.0), AxisLimits::unbounded());
        pid.set_setpoint(10.0);
        // error = 10 → output = 20
        assert!((pid.step(0.0) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn integral_resets_outside_band() {
        let mut pid = AxisPid::new(AxisGains::new(0.0, 1.0, 0.0), limits(100.0, 0.0, 5.0, 0.0));
        pid.set_setpoint(0.0);
        for _ in 0..10 {
            pid.step(-2.0); // error 2, inside band
        }
        assert!((pid.integral() - 20.0).abs() < 1e-9);

        for _ in 0..3 {
            pid.step(-50.0); // error 50, outside band
        }
        assert_eq!(pid.integral(), 0.0);
    }

    #[test]
    fn integral_limit_caps_accumulator() {
        let mut l = limits(100.0, 0.0, 10.0, 0.0);
        l.integral_limit = Some(20.0);
        let mut pid = AxisPid::new(AxisGains::new(0.0, 1.0, 0.0), l);
        pid.set_setpoint(5.0);
        for _ in 0..100 {
            pid.step(0.0);
        }
        assert!((pid.integral() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn output_never_exceeds_clamp() {
        let mut pid = AxisPid::new(AxisGains::new(3.0, 0.5, 2.0), limits(0.7, 0.1, 1e9, 1.0));
        for &sp in &[1e6, -1e6, 42.0, -3.5, 1e-3] {
            pid.set_setpoint(sp);
            for _ in 0..5 {
                assert!(pid.step(0.0).abs() <= 0.7);
            }
        }
    }

    #[test]
    fn minimum_power_floor_keeps_sign() {
        let mut pid = AxisPid::new(AxisGains::p(0.001), limits(0.7, 0.1, 0.0, 1.0));
        pid.set_setpoint(10.0);
        assert!((pid.step(0.0) - 0.1).abs() < 1e-12);
        pid.set_setpoint(-10.0);
        assert!((pid.step(0.0) + 0.1).abs() < 1e-12);
    }

    #[test]
    fn floor_not_applied_inside_stop_threshold() {
        let mut pid = AxisPid::new(AxisGains::p(0.001), limits(0.7, 0.1, 0.0, 1.0));
        pid.set_setpoint(0.5);
        let out = pid.step(0.0);
        assert!((out - 0.0005).abs() < 1e-12);
        assert_eq!(pid.state(), AxisState::Converged);
    }

    #[test]
    fn zero_output_stays_zero() {
        let mut pid = AxisPid::new(AxisGains::p(0.0), limits(0.7, 0.1, 0.0, 1.0));
        pid.set_setpoint(50.0);
        assert_eq!(pid.step(0.0), 0.0);
    }

    #[test]
    fn derivative_uses_previous_error() {
        let mut pid = AxisPid::new(AxisGains::new(0.0, 0.0, 1.0), AxisLimits::unbounded());
        pid.set_setpoint(10.0);
        // last_error starts at 0 → derivative = 10
        assert!((pid.step(0.0) - 10.0).abs() < 1e-9);
        // error 6 → derivative = -4
        assert!((pid.step(4.0) + 4.0).abs() < 1e-9);
    }

    #[test]
    fn heading_axis_takes_short_way_round() {
        let mut pid = AxisPid::heading(&CrawlerConfig::default().turn);
        pid.set_setpoint(170.0);
        assert!((pid.error(-170.0) + 20.0).abs() < 1e-9);
        // 0.03 * -20 = -0.6
        assert!((pid.step(-170.0) + 0.6).abs() < 1e-9);
    }

    #[test]
    fn distance_axis_gain_is_per_meter() {
        let cfg = CrawlerConfig::default();
        let tpm = cfg.ticks_per_meter();
        let mut pid = AxisPid::distance(&cfg.drive, tpm, cfg.power_clamp, cfg.min_power);
        pid.set_setpoint(0.5 * tpm);
        // kp 0.6 × 0.5 m; outside the 0.1 m integral band
        assert!((pid.step(0.0) - 0.3).abs() < 1e-9);
        assert_eq!(pid.integral(), 0.0);
    }

    #[test]
    fn state_machine_transitions() {
        let mut pid = AxisPid::new(AxisGains::p(0.1), limits(1.0, 0.0, 0.0, 1.0));
        assert_eq!(pid.state(), AxisState::Idle);
        pid.set_setpoint(10.0);
        pid.step(0.0);
        assert_eq!(pid.state(), AxisState::Running);
        pid.step(9.5);
        assert_eq!(pid.state(), AxisState::Converged);
        pid.mark_timed_out();
        assert_eq!(pid.state(), AxisState::TimedOut);
        pid.reset();
        assert_eq!(pid.state(), AxisState::Idle);
        assert_eq!(pid.integral(), 0.0);
    }
}
