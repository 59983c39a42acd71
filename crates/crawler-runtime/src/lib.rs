//! `crawler-runtime` – the control loops of the Crawler stack.
//!
//! Everything here is synchronous: a primitive blocks its caller until it
//! converges, times out or is cancelled, polling sensors and writing motors
//! once per tick.
//!
//! # Modules
//!
//! - [`engine`] – [`MotionEngine`]: robot-oriented drive, strafe and turn
//!   primitives plus path following, all on one owned [`Hardware`][crawler_hal::Hardware]
//!   bundle.
//! - [`follower`] – [`PathFollower`]: pure pursuit over a waypoint list with
//!   percentage-triggered [`PathMarker`]s.
//! - [`localizer`] – [`PoseSource`] and its two implementations,
//!   [`EncoderLocalizer`] and [`TrackingOdometry`].
//! - [`program`] – [`MotionProgram`], [`Recipe`] and [`Step`]: sequencing of
//!   primitives into autonomous routines.
//! - [`recipes`] – the reference robot's routines.
//! - [`cancel`] – [`CancelToken`], the cooperative stop signal checked every
//!   tick.
//! - [`deadline`] – [`Deadline`], a monotonic time budget.
//! - [`telemetry`] – [`init_tracing`]: `tracing` subscriber setup with an
//!   optional OTLP exporter (`OTEL_EXPORTER_OTLP_ENDPOINT`).

pub mod cancel;
pub mod deadline;
pub mod engine;
pub mod follower;
pub mod localizer;
pub mod program;
pub mod recipes;
pub mod telemetry;

pub use cancel::CancelToken;
pub use deadline::Deadline;
pub use engine::MotionEngine;
pub use follower::{FieldDrive, MarkerAction, PathFollower, PathMarker, PursuitCommand};
pub use localizer::{EncoderLocalizer, PoseSource, TrackingOdometry};
pub use program::{MotionProgram, Recipe, Step};
pub use recipes::Mechanisms;
pub use telemetry::{TracerProviderGuard, init_tracing};
