//! Heading sensor abstraction.
//!
//! Yaw follows the usual field convention: counter-clockwise positive. The
//! engine normalizes every reading before using it, so drivers may report
//! any equivalent angle.

use crawler_types::{AngleUnit, CrawlerError};

pub trait HeadingSensor: Send {
    /// Current yaw in `unit`.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError::SensorUnavailable`] when the sensor has no
    /// fresh reading.
    fn yaw(&self, unit: AngleUnit) -> Result<f64, CrawlerError>;

    /// Make the current orientation the zero heading.
    fn reset_yaw(&mut self) -> Result<(), CrawlerError>;
}
