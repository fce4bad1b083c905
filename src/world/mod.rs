//! Footprint collision model.
//!
//! Answers one question: what is the worst cell cost the robot footprint
//! touches when placed at a pose, or is the placement in collision?
//! Only the polygon edges are rasterized; the interior is covered by the
//! center-cell inscribed check, which is sufficient for the convex
//! footprints this controller is used with.

use crate::core::{Point2D, Pose2D};
use crate::grid::{costs, traverse_line, CostmapSnapshot, GridCoord};

/// Sentinel returned for a colliding or off-map placement.
pub const COLLISION_COST: f32 = -1.0;

/// Maximum cell cost touched by the footprint at `pose`, or
/// [`COLLISION_COST`] when any edge crosses a lethal or unknown cell,
/// leaves the grid, or the robot center sits on an inscribed cell.
///
/// A footprint with fewer than three vertices degenerates to the
/// center-cell check.
pub fn footprint_cost(pose: &Pose2D, footprint: &[Point2D], map: &CostmapSnapshot) -> f32 {
    let center = map.world_to_grid(pose.position());
    let center_cost = cell_cost(map, center);
    if center_cost < 0.0 || map.cost(center) >= costs::INSCRIBED {
        return COLLISION_COST;
    }

    if footprint.len() < 3 {
        return center_cost;
    }

    let mut max_cost = center_cost;
    for i in 0..footprint.len() {
        let a = pose.transform_point(&footprint[i]);
        let b = pose.transform_point(&footprint[(i + 1) % footprint.len()]);
        let edge = line_cost(map, map.world_to_grid(a), map.world_to_grid(b));
        if edge < 0.0 {
            return COLLISION_COST;
        }
        max_cost = max_cost.max(edge);
    }

    max_cost
}

/// Maximum cell cost along a rasterized grid line, or [`COLLISION_COST`]
/// when the line touches a lethal/unknown cell or leaves the grid.
pub(crate) fn line_cost(map: &CostmapSnapshot, from: GridCoord, to: GridCoord) -> f32 {
    let mut max_cost = 0.0f32;
    let mut collided = false;
    traverse_line(from, to, |cell| {
        let c = cell_cost(map, cell);
        if c < 0.0 {
            collided = true;
            return false;
        }
        max_cost = max_cost.max(c);
        true
    });
    if collided {
        COLLISION_COST
    } else {
        max_cost
    }
}

#[inline]
fn cell_cost(map: &CostmapSnapshot, cell: GridCoord) -> f32 {
    if !map.in_bounds(cell) {
        return COLLISION_COST;
    }
    match map.cost(cell) {
        costs::LETHAL | costs::UNKNOWN => COLLISION_COST,
        // INSCRIBED is tolerated under an edge but not under the center
        c => c as f32,
    }
}
