//! Sampled trajectory produced by the rollout engine.

use crate::core::{Pose2D, Velocity};

/// A forward-simulated trajectory for one velocity sample.
///
/// `points` holds the simulated poses, starting exactly at the rollout
/// start pose. The stored velocities are the *sample* that produced the
/// trajectory, which is what gets emitted as the command when this
/// trajectory wins. A negative `cost` marks the trajectory infeasible
/// (collision, off-map, or an end cell unreachable from the plan).
#[derive(Clone, Debug)]
pub struct Trajectory {
    /// Simulated poses, first one equal to the start pose
    pub points: Vec<Pose2D>,
    /// Sampled forward velocity (m/s)
    pub vx: f32,
    /// Sampled lateral velocity (m/s)
    pub vy: f32,
    /// Sampled angular velocity (rad/s)
    pub vtheta: f32,
    /// Aggregate score, lower is better; negative = infeasible
    pub cost: f32,
    /// Simulation step between consecutive points (seconds)
    pub time_delta: f32,
}

impl Trajectory {
    pub fn new(sample: Velocity, time_delta: f32) -> Self {
        Self {
            points: Vec::new(),
            vx: sample.vx,
            vy: sample.vy,
            vtheta: sample.vtheta,
            cost: -1.0,
            time_delta,
        }
    }

    /// The velocity command this trajectory stands for.
    #[inline]
    pub fn velocity(&self) -> Velocity {
        Velocity::new(self.vx, self.vy, self.vtheta)
    }

    #[inline]
    pub fn is_feasible(&self) -> bool {
        self.cost >= 0.0
    }

    /// Final simulated pose, if any point was produced.
    #[inline]
    pub fn end_pose(&self) -> Option<&Pose2D> {
        self.points.last()
    }
}
