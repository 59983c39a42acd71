//! Motion programs: named sequences of primitives run against a
//! [`MotionEngine`].
//!
//! | Item | Description |
//! |---|---|
//! | [`MotionProgram`] | Anything that can drive the engine; implemented by [`Recipe`] and by closures. |
//! | [`Recipe`] | An ordered list of [`Step`]s built with chained methods. |
//! | [`Step`] | One primitive, a path, or an opaque mechanism action. |
//!
//! A recipe runs its steps in order. A cancelled step ends the recipe at
//! once; a timed-out step is logged and the next step still runs, exactly as
//! a primitive's caller would carry on after a timeout.
//!
//! # Example
//!
//! ```rust
//! use crawler_runtime::program::Recipe;
//!
//! let recipe = Recipe::new("square-ish")
//!     .drive(0.5, 0.0)
//!     .turn(90.0)
//!     .strafe(-0.25, 90.0);
//! assert_eq!(recipe.len(), 3);
//! ```

use std::fmt;

use crawler_geometry::Pose;
use crawler_types::{CrawlerError, MotionOutcome};
use tracing::{info, instrument, warn};

use crate::engine::MotionEngine;
use crate::follower::{MarkerAction, PathMarker};

/// A routine that drives a [`MotionEngine`] to completion.
pub trait MotionProgram {
    /// Run the routine.
    ///
    /// # Errors
    ///
    /// Hardware faults and failing actions propagate; timeouts and
    /// cancellation are reported through the returned [`MotionOutcome`].
    fn execute(&mut self, engine: &mut MotionEngine) -> Result<MotionOutcome, CrawlerError>;
}

impl<F> MotionProgram for F
where
    F: FnMut(&mut MotionEngine) -> Result<MotionOutcome, CrawlerError>,
{
    fn execute(&mut self, engine: &mut MotionEngine) -> Result<MotionOutcome, CrawlerError> {
        self(engine)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Step
// ─────────────────────────────────────────────────────────────────────────────

pub enum Step {
    Drive { meters: f64, heading_deg: f64 },
    Strafe { meters: f64, heading_deg: f64 },
    Turn { heading_deg: f64 },
    FollowPath { path: Vec<Pose>, markers: Vec<PathMarker> },
    /// Opaque mechanism call (shooter, intake, ...). Returning
    /// [`CrawlerError::Interrupted`] stops the recipe as cancelled.
    Action { name: String, action: MarkerAction },
}

impl Step {
    fn run(&mut self, engine: &mut MotionEngine) -> Result<MotionOutcome, CrawlerError> {
        match self {
            Step::Drive {
                meters,
                heading_deg,
            } => engine.drive_distance(*meters, *heading_deg),
            Step::Strafe {
                meters,
                heading_deg,
            } => engine.strafe_distance(*meters, *heading_deg),
            Step::Turn { heading_deg } => engine.turn_to_heading(*heading_deg),
            Step::FollowPath { path, markers } => engine.follow_path(path, markers),
            Step::Action { name, action } => match action() {
                Ok(()) => {
                    info!(action = %name, "action done");
                    Ok(MotionOutcome::Converged)
                }
                Err(CrawlerError::Interrupted(reason)) => {
                    info!(action = %name, %reason, "action interrupted");
                    Ok(MotionOutcome::Cancelled)
                }
                Err(e) => Err(e),
            },
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Drive {
                meters,
                heading_deg,
            } => write!(f, "drive {meters} m @ {heading_deg}°"),
            Step::Strafe {
                meters,
                heading_deg,
            } => write!(f, "strafe {meters} m @ {heading_deg}°"),
            Step::Turn { heading_deg } => write!(f, "turn to {heading_deg}°"),
            Step::FollowPath { path, markers } => write!(
                f,
                "follow path ({} waypoints, {} markers)",
                path.len(),
                markers.len()
            ),
            Step::Action { name, .. } => write!(f, "action '{name}'"),
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Recipe
// ─────────────────────────────────────────────────────────────────────────────

/// A named autonomous routine.
#[derive(Debug)]
pub struct Recipe {
    name: String,
    steps: Vec<Step>,
}

impl Recipe {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn drive(self, meters: f64, heading_deg: f64) -> Self {
        self.step(Step::Drive {
            meters,
            heading_deg,
        })
    }

    pub fn strafe(self, meters: f64, heading_deg: f64) -> Self {
        self.step(Step::Strafe {
            meters,
            heading_deg,
        })
    }

    pub fn turn(self, heading_deg: f64) -> Self {
        self.step(Step::Turn { heading_deg })
    }

    pub fn follow_path(self, path: Vec<Pose>, markers: Vec<PathMarker>) -> Self {
        self.step(Step::FollowPath { path, markers })
    }

    pub fn action(
        self,
        name: impl Into<String>,
        action: impl FnMut() -> Result<(), CrawlerError> + Send + 'static,
    ) -> Self {
        self.step(Step::Action {
            name: name.into(),
            action: Box::new(action),
        })
    }
}

impl MotionProgram for Recipe {
    #[instrument(skip_all, fields(recipe = %self.name, steps = self.steps.len()))]
    fn execute(&mut self, engine: &mut MotionEngine) -> Result<MotionOutcome, CrawlerError> {
        info!("recipe started");
        let mut timed_out = false;
        for (index, step) in self.steps.iter_mut().enumerate() {
            match step.run(engine)? {
                MotionOutcome::Converged => {}
                MotionOutcome::TimedOut => {
                    warn!(index, step = %step, "step timed out; continuing");
                    timed_out = true;
                }
                MotionOutcome::Cancelled => {
                    info!(index, step = %step, "recipe cancelled");
                    return Ok(MotionOutcome::Cancelled);
                }
            }
        }
        info!(timed_out, "recipe finished");
        Ok(if timed_out {
            MotionOutcome::TimedOut
        } else {
            MotionOutcome::Converged
        })
    }
}
