//! Per-cycle velocity controller.
//!
//! [`TrajectoryController`] ties the planner core to its collaborators:
//! each `compute_velocity_commands` call transforms and prunes the
//! retained global plan, snapshots the costmap, scores candidate
//! trajectories, and runs the terminal state machine once the goal
//! position is reached (decelerate, rotate in place, done).
//!
//! The controller is driven by a single control thread; the only other
//! thread it interacts with is the transport pushing odometry through
//! [`OdometryBuffer`].

mod odometry;
mod sources;
mod viz;

pub use odometry::OdometryBuffer;
pub use sources::{CostmapSource, TransformSource};
pub use viz::{LocalPlanPublisher, PlanVisualization};

use crossbeam_channel::Receiver;

use crate::config::PlannerConfig;
use crate::core::{math::shortest_angular_distance, Pose2D, StampedPose, Velocity};
use crate::error::{PlannerError, Result};
use crate::grid::CostmapSnapshot;
use crate::planner::LocalPlanner;

/// Collaborator handles and planner state, present once initialized.
struct ControllerCore {
    tf: Box<dyn TransformSource>,
    costmap: Box<dyn CostmapSource>,
    planner: LocalPlanner,
    global_frame: String,
    base_frame: String,
}

/// Local trajectory controller.
///
/// Construct with [`TrajectoryController::new`], wire the collaborators
/// with [`initialize`](Self::initialize), then call
/// [`set_plan`](Self::set_plan) and
/// [`compute_velocity_commands`](Self::compute_velocity_commands) from
/// the control loop.
pub struct TrajectoryController {
    name: String,
    config: PlannerConfig,
    core: Option<ControllerCore>,
    /// Retained global plan, replaced by set_plan and shortened in
    /// place by pruning
    global_plan: Vec<StampedPose>,
    odom: OdometryBuffer,
    viz: LocalPlanPublisher,
    /// True only while inside the xy tolerance and not yet oriented
    rotating_to_goal: bool,
    /// Latched by the cycle that leaves the terminal machine in done
    goal_reached: bool,
}

impl TrajectoryController {
    pub fn new(name: impl Into<String>, config: PlannerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            core: None,
            global_plan: Vec::new(),
            odom: OdometryBuffer::new(),
            viz: LocalPlanPublisher::new(),
            rotating_to_goal: false,
            goal_reached: false,
        }
    }

    /// Wire the transform and costmap collaborators. One-shot: repeated
    /// calls warn and change nothing.
    pub fn initialize(
        &mut self,
        tf: Box<dyn TransformSource>,
        costmap: Box<dyn CostmapSource>,
    ) -> Result<()> {
        if self.core.is_some() {
            log::warn!(
                "{}: already initialized, ignoring repeated initialize()",
                self.name
            );
            return Ok(());
        }
        self.config.validate()?;

        let footprint = costmap.footprint();
        let global_frame = costmap.global_frame_id();
        let base_frame = costmap.base_frame_id();
        log::info!(
            "{}: controlling in frame '{}' (base '{}'), map {}x{} @ {:.3} m/cell, \
             footprint {} vertices, inscribed {:.2} m, circumscribed {:.2} m",
            self.name,
            global_frame,
            base_frame,
            costmap.size_cells_x(),
            costmap.size_cells_y(),
            costmap.resolution(),
            footprint.len(),
            costmap.inscribed_radius(),
            costmap.circumscribed_radius(),
        );

        let planner = LocalPlanner::new(&self.config, footprint);
        self.core = Some(ControllerCore {
            tf,
            costmap,
            planner,
            global_frame,
            base_frame,
        });
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.core.is_some()
    }

    /// Replace the retained global plan. The plan geometry is not
    /// validated; the last pose is taken as the goal.
    pub fn set_plan(&mut self, plan: Vec<StampedPose>) -> Result<()> {
        if self.core.is_none() {
            return Err(PlannerError::NotInitialized);
        }
        self.global_plan = plan;
        self.rotating_to_goal = false;
        self.goal_reached = false;
        Ok(())
    }

    /// Handle for the transport thread to push odometry through.
    pub fn odometry(&self) -> OdometryBuffer {
        self.odom.clone()
    }

    /// Observe the transformed plan and chosen local trajectory.
    pub fn subscribe_visualization(&mut self) -> Receiver<PlanVisualization> {
        self.viz.subscribe()
    }

    /// True iff the last successful cycle finished the terminal machine.
    pub fn is_goal_reached(&self) -> bool {
        self.goal_reached
    }

    /// The retained global plan as pruning has left it.
    pub fn plan(&self) -> &[StampedPose] {
        &self.global_plan
    }

    /// Run one control cycle and produce a body-frame command.
    ///
    /// Every failure path returns an error and leaves the retained plan
    /// and terminal state untouched; escalation (recovery behaviors,
    /// abort) is the caller's concern.
    pub fn compute_velocity_commands(&mut self) -> Result<Velocity> {
        if self.core.is_none() {
            return Err(PlannerError::NotInitialized);
        }
        if self.global_plan.is_empty() {
            return Err(PlannerError::EmptyPlan);
        }

        let (robot_pose, mut transformed) = {
            let core = self.core.as_ref().ok_or(PlannerError::NotInitialized)?;
            let robot = core
                .costmap
                .robot_pose()
                .ok_or(PlannerError::PoseUnavailable)?;
            let transformed = transform_global_plan(
                core.tf.as_ref(),
                core.costmap.as_ref(),
                &core.global_frame,
                &core.base_frame,
                &self.global_plan,
            )?;
            (robot.pose, transformed)
        };

        if self.config.prune_plan {
            prune_plan(&robot_pose, &mut transformed, &mut self.global_plan);
        }
        if transformed.is_empty() {
            log::warn!("{}: no plan points inside the local window", self.name);
            return Err(PlannerError::EmptyPlan);
        }

        let vel = self.odom.latest();
        let goal = *transformed.last().ok_or(PlannerError::EmptyPlan)?;

        let core = self.core.as_mut().ok_or(PlannerError::NotInitialized)?;

        // Fresh snapshot for this cycle, with the robot cleared out of it
        core.costmap.clear_robot_footprint();
        let snapshot = core.costmap.snapshot();

        core.planner.update_plan(&transformed);

        let goal_distance = robot_pose.position().distance(&goal.position());
        if goal_distance <= self.config.goal.xy_goal_tolerance {
            // Refresh the distance fields so the validation rollouts in
            // the terminal machine score against this cycle's plan
            let _ = core.planner.find_best_path(&snapshot, robot_pose, vel);

            let cmd = terminal_cycle(
                &self.name,
                &self.config,
                &core.planner,
                &snapshot,
                robot_pose,
                vel,
                goal.theta,
                &mut self.rotating_to_goal,
                &mut self.goal_reached,
            );
            self.viz.publish(&PlanVisualization {
                global_plan: transformed,
                local_plan: Vec::new(),
            });
            return match cmd {
                Some(cmd) => Ok(cmd),
                None if self.config.goal.legacy_goal_compat => {
                    log::debug!(
                        "{}: goal-phase sample invalid, legacy compat emits zero command",
                        self.name
                    );
                    Ok(Velocity::zero())
                }
                None => Err(PlannerError::NoValidTrajectory),
            };
        }

        match core.planner.find_best_path(&snapshot, robot_pose, vel) {
            Some(best) => {
                self.viz.publish(&PlanVisualization {
                    global_plan: transformed,
                    local_plan: best.points.clone(),
                });
                Ok(best.velocity())
            }
            None => {
                self.viz.publish(&PlanVisualization {
                    global_plan: transformed,
                    local_plan: Vec::new(),
                });
                Err(PlannerError::NoValidTrajectory)
            }
        }
    }
}

/// The translate / stop / rotate / done machine, evaluated once the
/// robot is inside the xy tolerance.
///
/// Returns `None` when the stop or rotate sample failed validation.
#[allow(clippy::too_many_arguments)]
fn terminal_cycle(
    name: &str,
    config: &PlannerConfig,
    planner: &LocalPlanner,
    snapshot: &CostmapSnapshot,
    robot_pose: Pose2D,
    vel: Velocity,
    goal_yaw: f32,
    rotating_to_goal: &mut bool,
    goal_reached: &mut bool,
) -> Option<Velocity> {
    let oriented =
        shortest_angular_distance(robot_pose.theta, goal_yaw).abs() <= config.goal.yaw_goal_tolerance;
    let stopped = vel.is_stopped(
        config.goal.trans_stopped_velocity,
        config.goal.rot_stopped_velocity,
    );

    if oriented {
        *rotating_to_goal = false;
        if stopped {
            log::info!("{}: goal reached", name);
            *goal_reached = true;
            return Some(Velocity::zero());
        }
        // In position and oriented but still moving: keep braking
        return stop_with_acc_limits(config, planner, snapshot, robot_pose, vel);
    }

    if !*rotating_to_goal && !stopped {
        stop_with_acc_limits(config, planner, snapshot, robot_pose, vel)
    } else {
        *rotating_to_goal = true;
        rotate_to_goal(config, planner, snapshot, robot_pose, vel, goal_yaw)
    }
}

/// Transform the retained plan into the costmap frame, keeping only the
/// window of points the local grid can see.
///
/// The prefix of points farther than the window radius from the robot is
/// skipped; transformation then proceeds until points leave the window
/// again, so the result is a contiguous run of the original plan.
fn transform_global_plan(
    tf: &dyn TransformSource,
    costmap: &dyn CostmapSource,
    global_frame: &str,
    base_frame: &str,
    plan: &[StampedPose],
) -> Result<Vec<Pose2D>> {
    let first = plan.first().ok_or(PlannerError::EmptyPlan)?;
    let plan_frame = first.frame_id.as_str();

    let transform = tf.lookup_transform(global_frame, plan_frame, first.stamp_us)?;
    let robot_in_plan = tf.lookup_transform(plan_frame, base_frame, 0)?;
    let robot = robot_in_plan.position();

    let window =
        costmap.size_cells_x().max(costmap.size_cells_y()) as f32 * costmap.resolution() / 2.0;
    let sq_window = window * window;

    let mut i = 0;
    while i < plan.len() && robot.distance_squared(&plan[i].pose.position()) > sq_window {
        i += 1;
    }

    let mut transformed = Vec::new();
    while i < plan.len() {
        if robot.distance_squared(&plan[i].pose.position()) > sq_window {
            break;
        }
        transformed.push(transform.compose(&plan[i].pose));
        i += 1;
    }
    Ok(transformed)
}

/// Drop the already-passed prefix from both the transformed plan and the
/// retained global plan, in lockstep. Points are dropped while their
/// squared distance to the robot is at least 1 m²; the walk stops at the
/// first sufficiently close point.
fn prune_plan(robot: &Pose2D, transformed: &mut Vec<Pose2D>, global: &mut Vec<StampedPose>) {
    let position = robot.position();
    let mut dropped = 0;
    for pose in transformed.iter() {
        if position.distance_squared(&pose.position()) < 1.0 {
            break;
        }
        dropped += 1;
    }
    transformed.drain(..dropped);
    global.drain(..dropped.min(global.len()));
}

/// Decelerate every axis as hard as the acceleration limits allow.
///
/// The command is validated with a rollout; `None` means even braking
/// along the current heading is not collision-free.
fn stop_with_acc_limits(
    config: &PlannerConfig,
    planner: &LocalPlanner,
    map: &CostmapSnapshot,
    pose: Pose2D,
    vel: Velocity,
) -> Option<Velocity> {
    let period = config.sim.sim_period;
    let cmd = Velocity::new(
        vel.vx.signum() * (vel.vx.abs() - config.limits.acc_lim_x * period).max(0.0),
        vel.vy.signum() * (vel.vy.abs() - config.limits.acc_lim_y * period).max(0.0),
        vel.vtheta.signum() * (vel.vtheta.abs() - config.limits.acc_lim_theta * period).max(0.0),
    );

    if planner.check_trajectory(map, pose, vel, cmd) {
        log::debug!(
            "slowing down with ({:.2}, {:.2}, {:.2})",
            cmd.vx,
            cmd.vy,
            cmd.vtheta
        );
        Some(cmd)
    } else {
        None
    }
}

/// In-place rotation toward the goal heading.
///
/// The sampled angular velocity honors, in order: the in-place floor and
/// rotational ceiling, the range reachable within one control period,
/// and the speed from which the base can still stop exactly at the goal
/// heading. The result is validated with a zero-translation rollout.
fn rotate_to_goal(
    config: &PlannerConfig,
    planner: &LocalPlanner,
    map: &CostmapSnapshot,
    pose: Pose2D,
    vel: Velocity,
    goal_yaw: f32,
) -> Option<Velocity> {
    let limits = &config.limits;
    let ang_diff = shortest_angular_distance(pose.theta, goal_yaw);

    let mut v_theta = if ang_diff > 0.0 {
        limits
            .max_rotational_vel
            .min(ang_diff.max(limits.min_in_place_rotational_vel))
    } else {
        (-limits.max_rotational_vel).max(ang_diff.min(-limits.min_in_place_rotational_vel))
    };

    let max_acc_vel = vel.vtheta.abs() + limits.acc_lim_theta * config.sim.sim_period;
    let min_acc_vel = vel.vtheta.abs() - limits.acc_lim_theta * config.sim.sim_period;
    v_theta = v_theta.signum() * v_theta.abs().max(min_acc_vel).min(max_acc_vel);

    let max_speed_to_stop = (2.0 * limits.acc_lim_theta * ang_diff.abs()).sqrt();
    v_theta = v_theta.signum() * max_speed_to_stop.min(v_theta.abs());

    let cmd = Velocity::new(0.0, 0.0, v_theta);
    let valid = planner.check_trajectory(map, pose, vel, cmd);
    log::debug!(
        "rotating to goal heading, vtheta {:.2}, valid {}",
        v_theta,
        valid
    );
    if valid {
        Some(cmd)
    } else {
        None
    }
}
