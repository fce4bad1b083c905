//! GatiNav - local trajectory planner for mobile ground robots
//!
//! Consumes a precomputed global path and, at each control cycle, emits
//! a body-frame velocity command that follows the path while avoiding
//! obstacles and respecting acceleration limits.
//!
//! # Architecture
//!
//! The crate is organized in layers, foundation first:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   control/                          │  ← Per-cycle orchestration
//! │   (TrajectoryController, terminal FSM, odometry,    │
//! │    visualization, collaborator traits)              │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                   planner/                          │  ← Rollout + scoring
//! │      (sample generation, forward simulation)        │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌──────────────────────────────┬──────────────────────┐
//! │            grid/             │        world/        │  ← Cost fields
//! │ (costmap snapshot, map grid) │  (footprint model)   │
//! └──────────────────────────────┴──────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation
//! │               (poses, velocity, math)               │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Per-cycle data flow
//!
//! Global plan → transform into the costmap frame → prune behind the
//! robot → wavefront distance fields seeded from the plan → candidate
//! (vx, vy, vtheta) samples → forward-simulated and scored against the
//! fields and the footprint model → best trajectory's sample velocity
//! emitted. Once the goal position is inside tolerance, a terminal
//! machine takes over: decelerate, rotate in place, done.
//!
//! # Example
//!
//! ```rust,ignore
//! use gati_nav::{PlannerConfig, StampedPose, TrajectoryController};
//!
//! let mut controller = TrajectoryController::new("local_planner", PlannerConfig::default());
//! controller.initialize(Box::new(tf), Box::new(costmap))?;
//!
//! // The transport thread feeds odometry through a shared buffer
//! let odom = controller.odometry();
//!
//! controller.set_plan(plan)?;
//! loop {
//!     match controller.compute_velocity_commands() {
//!         Ok(cmd) => base.drive(cmd),
//!         Err(e) => recovery.escalate(e),
//!     }
//!     if controller.is_goal_reached() {
//!         break;
//!     }
//! }
//! ```

// Layer 1: foundation types (no internal deps)
pub mod core;

// Layer 2: cost fields (depends on core)
pub mod grid;
pub mod world;

// Layer 3: rollout planner (depends on core, grid, world)
pub mod planner;

// Layer 4: controller (depends on all layers)
pub mod control;

pub mod config;
pub mod error;

// Convenience re-exports
pub use config::PlannerConfig;
pub use control::{
    CostmapSource, LocalPlanPublisher, OdometryBuffer, PlanVisualization, TrajectoryController,
    TransformSource,
};
pub use self::core::{Point2D, Pose2D, StampedPose, Velocity};
pub use error::{PlannerError, Result, TransformError};
pub use grid::{costs, CostmapSnapshot, GridCoord, MapGrid};
pub use planner::{LocalPlanner, Trajectory};
