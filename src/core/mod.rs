//! Foundation types shared by every planner layer.
//!
//! Coordinates follow REP-103: x forward, y left, theta CCW from +x.

pub mod math;
mod pose;
mod velocity;

pub use pose::{Point2D, Pose2D, StampedPose};
pub use velocity::Velocity;
