//! Cumulative tick counters of the dead-wheel odometry pods.

use crawler_types::CrawlerError;

/// Which odometry pod an encoder belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncoderId {
    /// Parallel pod on the left side.
    Left,
    /// Parallel pod on the right side.
    Right,
    /// Perpendicular (lateral) pod.
    Center,
}

impl EncoderId {
    pub fn name(self) -> &'static str {
        match self {
            EncoderId::Left => "leftOdo",
            EncoderId::Right => "rightOdo",
            EncoderId::Center => "centerOdo",
        }
    }
}

impl std::fmt::Display for EncoderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A cumulative encoder.
///
/// The count is monotonic only while the wheel turns one way; its sign
/// depends on how the pod is mounted.
pub trait Encoder: Send {
    fn id(&self) -> EncoderId;

    /// Current cumulative count in raw ticks.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError::SensorUnavailable`] when no reading could be
    /// obtained this tick. Callers treat that as recoverable and retry.
    fn ticks(&self) -> Result<f64, CrawlerError>;

    /// Zero the count and leave the encoder free-running.
    fn reset(&mut self) -> Result<(), CrawlerError>;
}
