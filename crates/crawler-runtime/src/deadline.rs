//! [`Deadline`] – monotonic time budget for one blocking primitive.
//!
//! Sampled once at primitive entry and checked every tick. Expiry is not an
//! error; the primitive stops exactly as if it had converged and reports
//! [`MotionOutcome::TimedOut`][crawler_types::MotionOutcome::TimedOut].

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    budget: Option<Duration>,
}

impl Deadline {
    /// Start a budget of `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget: Some(budget),
        }
    }

    /// Start an optional budget; `None` never expires.
    pub fn maybe_after(budget: Option<Duration>) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn budget(&self) -> Option<Duration> {
        self.budget
    }

    pub fn expired(&self) -> bool {
        self.budget.is_some_and(|b| self.started.elapsed() >= b)
    }
}
