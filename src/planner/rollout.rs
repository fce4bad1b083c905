//! Forward simulation of a single velocity sample.
//!
//! Split out of the planner core: everything here is the pure rollout.
//! Acceleration-limited velocity stepping, holonomic pose integration,
//! collision checks against the world model, and cost aggregation from
//! the distance fields.

use crate::core::{math::shortest_angular_distance, Pose2D, Velocity};
use crate::grid::CostmapSnapshot;
use crate::world;

use super::{LocalPlanner, Trajectory};

/// Advance one velocity axis toward `target` by at most `acc * dt`.
#[inline]
pub(crate) fn step_velocity(target: f32, current: f32, acc: f32, dt: f32) -> f32 {
    if target > current {
        target.min(current + acc * dt)
    } else {
        target.max(current - acc * dt)
    }
}

/// One Euler step of the holonomic motion model.
#[inline]
pub(crate) fn step_pose(pose: &Pose2D, vel: &Velocity, dt: f32) -> Pose2D {
    let (sin_t, cos_t) = pose.theta.sin_cos();
    Pose2D::new(
        pose.x + (vel.vx * cos_t - vel.vy * sin_t) * dt,
        pose.y + (vel.vx * sin_t + vel.vy * cos_t) * dt,
        pose.theta + vel.vtheta * dt,
    )
}

impl LocalPlanner {
    /// Roll out one sample from `start` at `start_vel` and score it.
    ///
    /// The returned trajectory's first point is exactly `start`. Cost is
    /// negative when any simulated placement collides or the end cell is
    /// unreachable from the plan seeds.
    pub(crate) fn generate_trajectory(
        &self,
        map: &CostmapSnapshot,
        start: Pose2D,
        start_vel: Velocity,
        sample: Velocity,
    ) -> Trajectory {
        let v_mag = sample.linear_magnitude();
        let steps = ((v_mag.max(sample.vtheta.abs()) * self.sim.sim_time)
            / self.sim.sim_granularity)
            .ceil()
            .max(1.0) as usize;
        let dt = self.sim.sim_time / steps as f32;

        let mut traj = Trajectory::new(sample, dt);
        traj.points.reserve(steps + 1);

        let start_cost = world::footprint_cost(&start, &self.footprint, map);
        traj.points.push(start);
        if start_cost < 0.0 {
            return traj;
        }

        // The heading term samples one pose partway through the rollout
        let heading_step = if self.scoring.heading_scoring {
            ((self.scoring.heading_scoring_timestep / dt).round() as usize).clamp(1, steps)
        } else {
            0
        };

        let mut pose = start;
        let mut vel = start_vel;
        let mut occ_cost = start_cost;
        let mut heading_diff = 0.0;

        for i in 1..=steps {
            vel.vx = step_velocity(sample.vx, vel.vx, self.limits.acc_lim_x, dt);
            vel.vy = step_velocity(sample.vy, vel.vy, self.limits.acc_lim_y, dt);
            vel.vtheta = step_velocity(sample.vtheta, vel.vtheta, self.limits.acc_lim_theta, dt);
            pose = step_pose(&pose, &vel, dt);

            let cost = world::footprint_cost(&pose, &self.footprint, map);
            if cost < 0.0 {
                traj.cost = world::COLLISION_COST;
                return traj;
            }
            occ_cost = occ_cost.max(cost);

            if i == heading_step {
                heading_diff = self.heading_diff(&pose);
            }

            traj.points.push(pose);
        }

        let end_cell = map.world_to_grid(pose.position());
        let path_dist = self.map_grid.path_dist(end_cell);
        let goal_dist = self.map_grid.goal_dist(end_cell);
        if !path_dist.is_finite() || !goal_dist.is_finite() {
            // Ended somewhere the wavefront never reached
            return traj;
        }

        traj.cost = self.scoring.path_distance_bias * path_dist
            + self.scoring.goal_distance_bias * goal_dist
            + self.scoring.occdist_scale * occ_cost;
        if self.scoring.heading_scoring {
            traj.cost += 0.3 * heading_diff;
        }
        traj
    }

    /// Absolute angular deviation between the sampled pose heading and
    /// the direction toward the plan point `heading_lookahead` meters
    /// past the closest plan point.
    fn heading_diff(&self, pose: &Pose2D) -> f32 {
        if self.plan.is_empty() {
            return 0.0;
        }

        let here = pose.position();
        let mut closest = 0;
        let mut best = f32::INFINITY;
        for (i, p) in self.plan.iter().enumerate() {
            let d = here.distance_squared(&p.position());
            if d < best {
                best = d;
                closest = i;
            }
        }

        let mut target = closest;
        let mut travelled = 0.0;
        while target + 1 < self.plan.len() && travelled < self.scoring.heading_lookahead {
            travelled += self.plan[target]
                .position()
                .distance(&self.plan[target + 1].position());
            target += 1;
        }

        let aim = &self.plan[target];
        let desired = (aim.y - pose.y).atan2(aim.x - pose.x);
        shortest_angular_distance(pose.theta, desired).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_velocity_clamps_to_acceleration() {
        // Cannot jump from 0 to 0.5 in one 0.025 s step at 2.5 m/s^2
        let v = step_velocity(0.5, 0.0, 2.5, 0.025);
        assert!((v - 0.0625).abs() < 1e-6);
        // Deceleration is clamped symmetrically
        let v = step_velocity(-0.5, 0.0, 2.5, 0.025);
        assert!((v + 0.0625).abs() < 1e-6);
        // Reachable targets are hit exactly
        let v = step_velocity(0.01, 0.0, 2.5, 0.025);
        assert!((v - 0.01).abs() < 1e-6);
    }

    #[test]
    fn test_step_pose_forward() {
        let pose = step_pose(&Pose2D::identity(), &Velocity::new(1.0, 0.0, 0.0), 0.1);
        assert!((pose.x - 0.1).abs() < 1e-6);
        assert!(pose.y.abs() < 1e-6);
    }

    #[test]
    fn test_step_pose_lateral_respects_heading() {
        // Facing +y, a +vy command moves the robot toward -x
        let start = Pose2D::new(0.0, 0.0, std::f32::consts::FRAC_PI_2);
        let pose = step_pose(&start, &Velocity::new(0.0, 1.0, 0.0), 0.1);
        assert!((pose.x + 0.1).abs() < 1e-6);
        assert!(pose.y.abs() < 1e-6);
    }
}
