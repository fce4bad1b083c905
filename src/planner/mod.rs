//! Rollout-based local planner core.
//!
//! [`LocalPlanner`] owns the per-cycle scoring state: the transformed
//! plan, the wavefront distance fields built from it, and the
//! oscillation bookkeeping. The controller feeds it a fresh costmap
//! snapshot each cycle and asks for the best velocity command.

mod rollout;
mod sampling;
mod trajectory;

pub use sampling::OscillationState;
pub use trajectory::Trajectory;

use crate::config::{LimitsConfig, OscillationConfig, PlannerConfig, ScoringConfig, SimConfig};
use crate::core::{Point2D, Pose2D, Velocity};
use crate::grid::{CostmapSnapshot, MapGrid};

/// Scores candidate velocity samples against the costmap and plan.
pub struct LocalPlanner {
    limits: LimitsConfig,
    sim: SimConfig,
    scoring: ScoringConfig,
    oscillation_cfg: OscillationConfig,
    footprint: Vec<Point2D>,
    map_grid: MapGrid,
    /// Transformed plan in the costmap frame, goal last
    plan: Vec<Pose2D>,
    oscillation: OscillationState,
}

impl LocalPlanner {
    pub fn new(config: &PlannerConfig, footprint: Vec<Point2D>) -> Self {
        Self {
            limits: config.limits.clone(),
            sim: config.sim.clone(),
            scoring: config.scoring.clone(),
            oscillation_cfg: config.oscillation.clone(),
            footprint,
            map_grid: MapGrid::new(0, 0),
            plan: Vec::new(),
            oscillation: OscillationState::default(),
        }
    }

    /// Replace the plan the distance fields are seeded from.
    pub fn update_plan(&mut self, plan: &[Pose2D]) {
        self.plan.clear();
        self.plan.extend_from_slice(plan);
    }

    /// Rebuild the distance fields and pick the cheapest feasible
    /// trajectory for the current cycle.
    ///
    /// Ties go to the earlier-enumerated sample. When every translating
    /// and rotating sample is infeasible the backup sample is tried as
    /// an escape; `None` means even that failed and the caller has no
    /// command this cycle.
    pub fn find_best_path(
        &mut self,
        map: &CostmapSnapshot,
        pose: Pose2D,
        vel: Velocity,
    ) -> Option<Trajectory> {
        self.map_grid.rebuild(map, &self.plan);
        self.oscillation.reset_if_moved(&pose, &self.oscillation_cfg);

        let samples = sampling::generate_samples(&self.limits, &self.sim, &vel, &self.oscillation);

        let mut best: Option<Trajectory> = None;
        for sample in samples {
            let traj = self.generate_trajectory(map, pose, vel, sample);
            if traj.is_feasible() && best.as_ref().map_or(true, |b| traj.cost < b.cost) {
                best = Some(traj);
            }
        }

        match best {
            Some(traj) => {
                log::debug!(
                    "best trajectory ({:.2}, {:.2}, {:.2}) cost {:.3}",
                    traj.vx,
                    traj.vy,
                    traj.vtheta,
                    traj.cost
                );
                self.oscillation.note_selection(&pose, &traj);
                Some(traj)
            }
            None => {
                // Everything blocked; try backing out
                let backup = Velocity::new(self.limits.backup_vel, 0.0, 0.0);
                let traj = self.generate_trajectory(map, pose, vel, backup);
                if traj.is_feasible() {
                    log::warn!(
                        "all candidate trajectories infeasible, escaping at vx {:.2}",
                        backup.vx
                    );
                    self.oscillation.note_escape(&pose);
                    Some(traj)
                } else {
                    log::warn!("all candidate trajectories infeasible, including backup");
                    None
                }
            }
        }
    }

    /// Validate a single velocity sample against the costmap.
    ///
    /// Scores against the distance fields built by the most recent
    /// `find_best_path`, so run that first in the same cycle.
    pub fn check_trajectory(
        &self,
        map: &CostmapSnapshot,
        pose: Pose2D,
        vel: Velocity,
        sample: Velocity,
    ) -> bool {
        self.generate_trajectory(map, pose, vel, sample).is_feasible()
    }

    pub fn footprint(&self) -> &[Point2D] {
        &self.footprint
    }
}
