//! Capability interfaces the controller consumes.
//!
//! The controller owns handles to its collaborators rather than the
//! collaborators themselves; passing them in at initialization keeps the
//! dependency one-directional even though the costmap provider has its
//! own consumers elsewhere.

use crate::core::{Point2D, Pose2D, StampedPose};
use crate::error::TransformError;
use crate::grid::CostmapSnapshot;

/// Access to the layered costmap and the robot state it tracks.
pub trait CostmapSource: Send {
    /// Copy of the current cost grid. Called once per control cycle;
    /// the copy is the only view of the map the cycle ever sees.
    fn snapshot(&self) -> CostmapSnapshot;

    /// Clear the cells under the robot footprint in the live map, so
    /// the robot does not score itself as an obstacle.
    fn clear_robot_footprint(&mut self);

    /// Robot pose in the global costmap frame, if currently known.
    fn robot_pose(&self) -> Option<StampedPose>;

    /// Footprint polygon in the base frame.
    fn footprint(&self) -> Vec<Point2D>;

    fn inscribed_radius(&self) -> f32;

    fn circumscribed_radius(&self) -> f32;

    fn global_frame_id(&self) -> String;

    fn base_frame_id(&self) -> String;

    fn size_cells_x(&self) -> usize;

    fn size_cells_y(&self) -> usize;

    fn resolution(&self) -> f32;
}

/// Access to the transform tree.
pub trait TransformSource: Send {
    /// Pose of `source_frame`'s origin expressed in `target_frame` at
    /// the given time; a stamp of 0 requests the latest available.
    fn lookup_transform(
        &self,
        target_frame: &str,
        source_frame: &str,
        stamp_us: u64,
    ) -> Result<Pose2D, TransformError>;
}
