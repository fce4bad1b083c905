//! Planner configuration.
//!
//! All tunables live in one [`PlannerConfig`] tree that deserializes
//! from TOML. Every field carries a serde default so partial files work;
//! `Default` produces a configuration suitable for a small indoor robot.

use serde::Deserialize;
use std::path::Path;

use crate::error::{PlannerError, Result};

/// Goal tolerance and terminal-phase settings.
#[derive(Clone, Debug, Deserialize)]
pub struct GoalConfig {
    /// Orientation success window (radians)
    #[serde(default = "default_yaw_goal_tolerance")]
    pub yaw_goal_tolerance: f32,

    /// Position success window (meters)
    #[serde(default = "default_xy_goal_tolerance")]
    pub xy_goal_tolerance: f32,

    /// Below this linear speed the robot counts as stopped (m/s)
    #[serde(default = "default_stopped_velocity")]
    pub trans_stopped_velocity: f32,

    /// Below this angular speed the robot counts as stopped (rad/s)
    #[serde(default = "default_stopped_velocity")]
    pub rot_stopped_velocity: f32,

    /// Report success from the goal branch even when the stop or rotate
    /// sample fails footprint validation. Matches the historical
    /// controller; leave off unless a caller depends on it.
    #[serde(default)]
    pub legacy_goal_compat: bool,
}

/// Velocity envelope and acceleration caps.
#[derive(Clone, Debug, Deserialize)]
pub struct LimitsConfig {
    /// Forward acceleration cap (m/s^2)
    #[serde(default = "default_acc_lim_xy")]
    pub acc_lim_x: f32,

    /// Lateral acceleration cap (m/s^2)
    #[serde(default = "default_acc_lim_xy")]
    pub acc_lim_y: f32,

    /// Angular acceleration cap (rad/s^2)
    #[serde(default = "default_acc_lim_theta")]
    pub acc_lim_theta: f32,

    /// Maximum forward velocity (m/s)
    #[serde(default = "default_max_vel_x")]
    pub max_vel_x: f32,

    /// Minimum forward velocity when translating (m/s)
    #[serde(default = "default_min_vel_x")]
    pub min_vel_x: f32,

    /// Maximum angular velocity, both signs (rad/s)
    #[serde(default = "default_max_rotational_vel")]
    pub max_rotational_vel: f32,

    /// Smallest angular velocity that still turns the base in place (rad/s)
    #[serde(default = "default_min_in_place_rotational_vel")]
    pub min_in_place_rotational_vel: f32,

    /// Escape velocity, negative = backward (m/s)
    #[serde(default = "default_backup_vel")]
    pub backup_vel: f32,

    /// Whether the base accepts independent vy commands
    #[serde(default = "default_true")]
    pub holonomic_robot: bool,

    /// Lateral velocities to explore on holonomic bases (m/s)
    #[serde(default = "default_y_vels")]
    pub y_vels: Vec<f32>,
}

/// Rollout simulation and sampling settings.
#[derive(Clone, Debug, Deserialize)]
pub struct SimConfig {
    /// Forward-simulation horizon (seconds)
    #[serde(default = "default_sim_time")]
    pub sim_time: f32,

    /// Spacing between simulated points (seconds)
    #[serde(default = "default_sim_granularity")]
    pub sim_granularity: f32,

    /// Control period assumed for acceleration windows (seconds)
    #[serde(default = "default_sim_period")]
    pub sim_period: f32,

    /// Number of forward-velocity samples
    #[serde(default = "default_vx_samples")]
    pub vx_samples: usize,

    /// Number of angular-velocity samples
    #[serde(default = "default_vtheta_samples")]
    pub vtheta_samples: usize,

    /// Restrict samples to the window reachable within one control
    /// period (dynamic window approach)
    #[serde(default = "default_true")]
    pub dwa: bool,
}

/// Trajectory cost weights.
#[derive(Clone, Debug, Deserialize)]
pub struct ScoringConfig {
    /// Weight on distance-to-path at the rollout end
    #[serde(default = "default_path_distance_bias")]
    pub path_distance_bias: f32,

    /// Weight on distance-to-goal at the rollout end
    #[serde(default = "default_goal_distance_bias")]
    pub goal_distance_bias: f32,

    /// Weight on the maximum obstacle cost touched
    #[serde(default = "default_occdist_scale")]
    pub occdist_scale: f32,

    /// How far ahead on the plan the heading term aims (meters)
    #[serde(default = "default_heading_lookahead")]
    pub heading_lookahead: f32,

    /// Score heading deviation instead of relying on path distance alone
    #[serde(default)]
    pub heading_scoring: bool,

    /// Rollout time at which the heading deviation is sampled (seconds)
    #[serde(default = "default_heading_scoring_timestep")]
    pub heading_scoring_timestep: f32,
}

/// Oscillation and escape bookkeeping distances.
#[derive(Clone, Debug, Deserialize)]
pub struct OscillationConfig {
    /// Travel required before rotation/strafe direction locks clear (meters)
    #[serde(default = "default_oscillation_reset_dist")]
    pub oscillation_reset_dist: f32,

    /// Travel required before the escaping flag clears (meters)
    #[serde(default = "default_escape_reset_dist")]
    pub escape_reset_dist: f32,

    /// Rotation required before the escaping flag clears (radians)
    #[serde(default = "default_escape_reset_theta")]
    pub escape_reset_theta: f32,
}

/// Top-level planner configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct PlannerConfig {
    #[serde(default)]
    pub goal: GoalConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub sim: SimConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub oscillation: OscillationConfig,

    /// Drop plan points already passed by the robot
    #[serde(default = "default_true")]
    pub prune_plan: bool,
}

// Default value functions
fn default_yaw_goal_tolerance() -> f32 {
    0.05
}
fn default_xy_goal_tolerance() -> f32 {
    0.10
}
fn default_stopped_velocity() -> f32 {
    1e-2
}
fn default_acc_lim_xy() -> f32 {
    2.5
}
fn default_acc_lim_theta() -> f32 {
    3.2
}
fn default_max_vel_x() -> f32 {
    0.5
}
fn default_min_vel_x() -> f32 {
    0.1
}
fn default_max_rotational_vel() -> f32 {
    1.0
}
fn default_min_in_place_rotational_vel() -> f32 {
    0.4
}
fn default_backup_vel() -> f32 {
    -0.1
}
fn default_y_vels() -> Vec<f32> {
    vec![-0.3, -0.1, 0.1, 0.3]
}
fn default_sim_time() -> f32 {
    1.0
}
fn default_sim_granularity() -> f32 {
    0.025
}
fn default_sim_period() -> f32 {
    0.1
}
fn default_vx_samples() -> usize {
    3
}
fn default_vtheta_samples() -> usize {
    20
}
fn default_path_distance_bias() -> f32 {
    0.6
}
fn default_goal_distance_bias() -> f32 {
    0.8
}
fn default_occdist_scale() -> f32 {
    0.01
}
fn default_heading_lookahead() -> f32 {
    0.325
}
fn default_heading_scoring_timestep() -> f32 {
    0.8
}
fn default_oscillation_reset_dist() -> f32 {
    0.05
}
fn default_escape_reset_dist() -> f32 {
    0.10
}
fn default_escape_reset_theta() -> f32 {
    std::f32::consts::FRAC_PI_4
}
fn default_true() -> bool {
    true
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self {
            yaw_goal_tolerance: default_yaw_goal_tolerance(),
            xy_goal_tolerance: default_xy_goal_tolerance(),
            trans_stopped_velocity: default_stopped_velocity(),
            rot_stopped_velocity: default_stopped_velocity(),
            legacy_goal_compat: false,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            acc_lim_x: default_acc_lim_xy(),
            acc_lim_y: default_acc_lim_xy(),
            acc_lim_theta: default_acc_lim_theta(),
            max_vel_x: default_max_vel_x(),
            min_vel_x: default_min_vel_x(),
            max_rotational_vel: default_max_rotational_vel(),
            min_in_place_rotational_vel: default_min_in_place_rotational_vel(),
            backup_vel: default_backup_vel(),
            holonomic_robot: true,
            y_vels: default_y_vels(),
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            sim_time: default_sim_time(),
            sim_granularity: default_sim_granularity(),
            sim_period: default_sim_period(),
            vx_samples: default_vx_samples(),
            vtheta_samples: default_vtheta_samples(),
            dwa: true,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            path_distance_bias: default_path_distance_bias(),
            goal_distance_bias: default_goal_distance_bias(),
            occdist_scale: default_occdist_scale(),
            heading_lookahead: default_heading_lookahead(),
            heading_scoring: false,
            heading_scoring_timestep: default_heading_scoring_timestep(),
        }
    }
}

impl Default for OscillationConfig {
    fn default() -> Self {
        Self {
            oscillation_reset_dist: default_oscillation_reset_dist(),
            escape_reset_dist: default_escape_reset_dist(),
            escape_reset_theta: default_escape_reset_theta(),
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            goal: GoalConfig::default(),
            limits: LimitsConfig::default(),
            sim: SimConfig::default(),
            scoring: ScoringConfig::default(),
            oscillation: OscillationConfig::default(),
            prune_plan: true,
        }
    }
}

impl PlannerConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PlannerError::Config(format!("failed to read config file: {}", e)))?;
        let config: PlannerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Sanity-check the configuration.
    ///
    /// Structural problems are errors; suspicious-but-workable values
    /// only produce warnings.
    pub fn validate(&self) -> Result<()> {
        if self.sim.sim_time <= 0.0 || self.sim.sim_granularity <= 0.0 {
            return Err(PlannerError::Config(
                "sim_time and sim_granularity must be positive".to_string(),
            ));
        }
        if self.sim.sim_period <= 0.0 {
            return Err(PlannerError::Config(
                "sim_period must be positive".to_string(),
            ));
        }
        if self.sim.vx_samples == 0 || self.sim.vtheta_samples == 0 {
            return Err(PlannerError::Config(
                "vx_samples and vtheta_samples must be at least 1".to_string(),
            ));
        }
        if self.limits.backup_vel >= 0.0 {
            log::warn!(
                "backup_vel is {:.2}; a non-negative value makes the escape \
                 action move the robot forward instead of backward",
                self.limits.backup_vel
            );
        }
        Ok(())
    }
}
