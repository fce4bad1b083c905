//! Costmap snapshot the planner scores against.
//!
//! The snapshot is a plain value copied from the costmap source at the
//! start of each control cycle; nothing in the planner observes mid-cycle
//! mutations of the live map.

use super::GridCoord;
use crate::core::Point2D;

/// Cell cost semantics.
///
/// Values between `FREE` and `UNKNOWN` are ordinary inflation costs; the
/// top three values carry special meaning.
pub mod costs {
    /// Safe to traverse, no penalty
    pub const FREE: u8 = 0;
    /// Never observed; treated as impassable by the collision model
    pub const UNKNOWN: u8 = 253;
    /// Within the inscribed radius of an obstacle, collision certain
    pub const INSCRIBED: u8 = 254;
    /// Obstacle, blocked
    pub const LETHAL: u8 = 255;
}

/// An immutable 2D cost grid with fixed resolution and origin.
#[derive(Clone, Debug)]
pub struct CostmapSnapshot {
    width: usize,
    height: usize,
    /// Meters per cell
    resolution: f32,
    /// World position of the (0, 0) cell corner
    origin: Point2D,
    costs: Vec<u8>,
}

impl CostmapSnapshot {
    /// Create a snapshot with every cell free.
    pub fn new(width: usize, height: usize, resolution: f32, origin: Point2D) -> Self {
        Self {
            width,
            height,
            resolution,
            origin,
            costs: vec![costs::FREE; width * height],
        }
    }

    /// Create a snapshot over an existing cost buffer (row-major,
    /// `width * height` cells).
    pub fn from_costs(
        width: usize,
        height: usize,
        resolution: f32,
        origin: Point2D,
        costs: Vec<u8>,
    ) -> Self {
        assert_eq!(costs.len(), width * height, "cost buffer size mismatch");
        Self {
            width,
            height,
            resolution,
            origin,
            costs,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    #[inline]
    pub fn origin(&self) -> Point2D {
        self.origin
    }

    #[inline]
    pub fn in_bounds(&self, coord: GridCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as usize) < self.width
            && (coord.y as usize) < self.height
    }

    /// Cost of a cell; out-of-bounds reads as `LETHAL`.
    #[inline]
    pub fn cost(&self, coord: GridCoord) -> u8 {
        if !self.in_bounds(coord) {
            return costs::LETHAL;
        }
        self.costs[coord.y as usize * self.width + coord.x as usize]
    }

    /// Set the cost of an in-bounds cell; out-of-bounds writes are ignored.
    #[inline]
    pub fn set_cost(&mut self, coord: GridCoord, cost: u8) {
        if self.in_bounds(coord) {
            self.costs[coord.y as usize * self.width + coord.x as usize] = cost;
        }
    }

    /// Convert world coordinates to the containing cell.
    #[inline]
    pub fn world_to_grid(&self, point: Point2D) -> GridCoord {
        GridCoord::new(
            ((point.x - self.origin.x) / self.resolution).floor() as i32,
            ((point.y - self.origin.y) / self.resolution).floor() as i32,
        )
    }

    /// Convert a cell to the world coordinates of its center.
    #[inline]
    pub fn grid_to_world(&self, coord: GridCoord) -> Point2D {
        Point2D::new(
            self.origin.x + (coord.x as f32 + 0.5) * self.resolution,
            self.origin.y + (coord.y as f32 + 0.5) * self.resolution,
        )
    }
}
