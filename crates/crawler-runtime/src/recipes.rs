//! Autonomous routines of the reference robot, as [`Recipe`] values.
//!
//! Mechanism calls (shooter, intake, indexer) are opaque to the motion
//! stack; callers inject them through [`Mechanisms`].

use crawler_geometry::Pose;
use crawler_types::CrawlerError;
use tracing::info;

use crate::follower::{MarkerAction, PathMarker};
use crate::program::Recipe;

/// Recipe names with a one-line description, in menu order.
pub const CATALOG: &[(&str, &str)] = &[
    ("just_go_straight", "drive 0.5 m forward"),
    ("red_goal", "drive to the red goal, shoot, strafe clear"),
    ("blue_goal", "square up, drive 1 m, strafe right of the blue goal"),
    ("blue_triangle", "long drive across the field, turn, shoot"),
    ("red_triangle", "long drive, turn to 106°, shoot"),
    ("field_demo", "pure-pursuit loop with intake and indexer markers"),
];

/// Mechanism actions a recipe may call.
pub struct Mechanisms {
    pub shoot: MarkerAction,
    pub intake_on: MarkerAction,
    pub cycle_indexer: MarkerAction,
    pub intake_off: MarkerAction,
}

impl Mechanisms {
    /// Actions that only log, for robots without mechanisms attached.
    pub fn logging() -> Self {
        fn log(name: &'static str) -> MarkerAction {
            Box::new(move || {
                info!(mechanism = name, "mechanism action");
                Ok(())
            })
        }
        Self {
            shoot: log("shoot"),
            intake_on: log("intake on"),
            cycle_indexer: log("cycle indexer"),
            intake_off: log("intake off"),
        }
    }
}

/// Build the recipe called `name`, or `None` if no such recipe exists.
pub fn build(name: &str, mechanisms: Mechanisms) -> Option<Recipe> {
    let Mechanisms {
        shoot,
        intake_on,
        cycle_indexer,
        intake_off,
    } = mechanisms;
    let recipe = match name {
        "just_go_straight" => just_go_straight(),
        "red_goal" => red_goal(shoot),
        "blue_goal" => blue_goal(),
        "blue_triangle" => blue_triangle(shoot),
        "red_triangle" => red_triangle(shoot),
        "field_demo" => field_demo(intake_on, cycle_indexer, intake_off),
        _ => return None,
    };
    Some(recipe)
}

pub fn just_go_straight() -> Recipe {
    Recipe::new("just_go_straight").drive(0.5, 0.0)
}

pub fn red_goal(shoot: impl FnMut() -> Result<(), CrawlerError> + Send + 'static) -> Recipe {
    Recipe::new("red_goal")
        .drive(1.54, 0.0)
        .action("shoot", shoot)
        .strafe(-1.0, 0.0)
}

pub fn blue_goal() -> Recipe {
    Recipe::new("blue_goal")
        .turn(0.0)
        .drive(1.0, 0.0)
        .strafe(1.0, 0.0)
}

pub fn blue_triangle(shoot: impl FnMut() -> Result<(), CrawlerError> + Send + 'static) -> Recipe {
    Recipe::new("blue_triangle")
        .turn(0.0)
        .drive(2.18, 178.0)
        .turn(50.0)
        .action("shoot", shoot)
}

pub fn red_triangle(shoot: impl FnMut() -> Result<(), CrawlerError> + Send + 'static) -> Recipe {
    Recipe::new("red_triangle")
        .drive(2.33, 0.0)
        .turn(106.0)
        .action("shoot", shoot)
}

/// Out 0.6 m, across 0.3 m, back to the start line. Meters and radians.
pub fn demo_path() -> Vec<Pose> {
    vec![
        Pose::from_degrees(0.0, 0.0, 0.0),
        Pose::from_degrees(0.6, 0.0, 0.0),
        Pose::from_degrees(0.6, 0.3, 90.0),
        Pose::from_degrees(0.0, 0.3, 180.0),
    ]
}

pub fn demo_markers(
    intake_on: MarkerAction,
    cycle_indexer: MarkerAction,
    intake_off: MarkerAction,
) -> Vec<PathMarker> {
    vec![
        PathMarker::new("intake on", 25.5, intake_on),
        PathMarker::new("cycle indexer", 50.0, cycle_indexer),
        PathMarker::new("intake off", 85.0, intake_off),
    ]
}

pub fn field_demo(
    intake_on: MarkerAction,
    cycle_indexer: MarkerAction,
    intake_off: MarkerAction,
) -> Recipe {
    Recipe::new("field_demo").follow_path(
        demo_path(),
        demo_markers(intake_on, cycle_indexer, intake_off),
    )
}
