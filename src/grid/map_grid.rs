//! Wavefront distance fields over the local costmap.
//!
//! Each control cycle the grid is rebuilt with two scalar fields: the
//! cell distance to the nearest plan cell (`path_dist`) and to the goal
//! cell (`goal_dist`). Both are computed by 4-connected BFS, so they are
//! shortest-path distances in cells through non-lethal space; lethal
//! cells act as barriers and keep trajectories from scoring as "close to
//! the path" through a wall.

use std::collections::VecDeque;

use super::{costs, traverse_line, CostmapSnapshot, GridCoord};
use crate::core::Pose2D;

const NEIGHBORS_4: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Per-cycle distance fields seeded from the transformed plan.
#[derive(Clone, Debug)]
pub struct MapGrid {
    width: usize,
    height: usize,
    path_dist: Vec<f32>,
    goal_dist: Vec<f32>,
    path_visited: Vec<bool>,
    goal_visited: Vec<bool>,
}

impl MapGrid {
    pub fn new(width: usize, height: usize) -> Self {
        let cells = width * height;
        Self {
            width,
            height,
            path_dist: vec![f32::INFINITY; cells],
            goal_dist: vec![f32::INFINITY; cells],
            path_visited: vec![false; cells],
            goal_visited: vec![false; cells],
        }
    }

    /// Reset every cell to {+inf, +inf, unvisited}, resizing to the
    /// snapshot dimensions when they changed.
    fn reset(&mut self, width: usize, height: usize) {
        let cells = width * height;
        self.width = width;
        self.height = height;
        self.path_dist.clear();
        self.path_dist.resize(cells, f32::INFINITY);
        self.goal_dist.clear();
        self.goal_dist.resize(cells, f32::INFINITY);
        self.path_visited.clear();
        self.path_visited.resize(cells, false);
        self.goal_visited.clear();
        self.goal_visited.resize(cells, false);
    }

    /// Rebuild both fields from the transformed plan.
    ///
    /// The path wave is seeded with every cell the plan covers; adjacent
    /// plan points are connected with a line traversal so sparse plans
    /// still seed a gap-free ridge. The goal wave is seeded with the
    /// last plan cell only.
    pub fn rebuild(&mut self, map: &CostmapSnapshot, plan: &[Pose2D]) {
        self.reset(map.width(), map.height());
        if plan.is_empty() {
            return;
        }

        let mut path_queue = VecDeque::new();
        let mut prev: Option<GridCoord> = None;
        for pose in plan {
            let cell = map.world_to_grid(pose.position());
            match prev {
                Some(p) if p != cell => {
                    traverse_line(p, cell, |c| {
                        self.seed_path_cell(map, c, &mut path_queue);
                        true
                    });
                }
                None => self.seed_path_cell(map, cell, &mut path_queue),
                _ => {}
            }
            prev = Some(cell);
        }

        let mut goal_queue = VecDeque::new();
        let goal_cell = map.world_to_grid(plan[plan.len() - 1].position());
        if map.in_bounds(goal_cell) && map.cost(goal_cell) < costs::UNKNOWN {
            let idx = self.index(goal_cell);
            self.goal_dist[idx] = 0.0;
            self.goal_visited[idx] = true;
            goal_queue.push_back(goal_cell);
        }

        Self::expand(
            map,
            &mut path_queue,
            &mut self.path_dist,
            &mut self.path_visited,
        );
        Self::expand(
            map,
            &mut goal_queue,
            &mut self.goal_dist,
            &mut self.goal_visited,
        );
    }

    /// Seed one plan cell into the path wave. Cells on obstacles (or
    /// unknown space) are skipped so a plan segment buried in a wall
    /// cannot leak zero distances to the far side.
    fn seed_path_cell(
        &mut self,
        map: &CostmapSnapshot,
        cell: GridCoord,
        queue: &mut VecDeque<GridCoord>,
    ) {
        if !map.in_bounds(cell) || map.cost(cell) >= costs::UNKNOWN {
            return;
        }
        let idx = self.index(cell);
        if self.path_visited[idx] {
            return;
        }
        self.path_dist[idx] = 0.0;
        self.path_visited[idx] = true;
        queue.push_back(cell);
    }

    /// Monotone BFS expansion of one field. A neighbor is enqueued iff it
    /// is in-bounds, not lethal, and not yet visited for this field.
    fn expand(
        map: &CostmapSnapshot,
        queue: &mut VecDeque<GridCoord>,
        dist: &mut [f32],
        visited: &mut [bool],
    ) {
        let width = map.width();
        while let Some(cell) = queue.pop_front() {
            let current = dist[cell.y as usize * width + cell.x as usize];
            for (dx, dy) in NEIGHBORS_4 {
                let next = GridCoord::new(cell.x + dx, cell.y + dy);
                if !map.in_bounds(next) {
                    continue;
                }
                if map.cost(next) >= costs::LETHAL {
                    continue;
                }
                let idx = next.y as usize * width + next.x as usize;
                if visited[idx] {
                    continue;
                }
                visited[idx] = true;
                dist[idx] = current + 1.0;
                queue.push_back(next);
            }
        }
    }

    #[inline]
    fn index(&self, coord: GridCoord) -> usize {
        coord.y as usize * self.width + coord.x as usize
    }

    /// Cell distance to the nearest plan cell; +inf when unreachable or
    /// out of bounds.
    #[inline]
    pub fn path_dist(&self, coord: GridCoord) -> f32 {
        if coord.x < 0
            || coord.y < 0
            || coord.x as usize >= self.width
            || coord.y as usize >= self.height
        {
            return f32::INFINITY;
        }
        self.path_dist[self.index(coord)]
    }

    /// Cell distance to the goal cell; +inf when unreachable or out of
    /// bounds.
    #[inline]
    pub fn goal_dist(&self, coord: GridCoord) -> f32 {
        if coord.x < 0
            || coord.y < 0
            || coord.x as usize >= self.width
            || coord.y as usize >= self.height
        {
            return f32::INFINITY;
        }
        self.goal_dist[self.index(coord)]
    }
}
