//! Candidate velocity enumeration.
//!
//! Samples are emitted in a fixed order (translating, then in-place
//! rotations); `find_best_path` breaks cost ties in favor of the
//! earlier sample, so the order is part of the planner's contract.

use crate::config::{LimitsConfig, OscillationConfig, SimConfig};
use crate::core::{math::shortest_angular_distance, Pose2D, Velocity};

use super::Trajectory;

/// One velocity axis window, optionally intersected with the range
/// reachable within one control period (the dynamic window).
fn window(lo: f32, hi: f32, current: f32, acc: f32, period: f32, dwa: bool) -> (f32, f32) {
    if !dwa {
        return (lo, hi);
    }
    let min = lo.max(current - acc * period);
    let max = hi.min(current + acc * period);
    // A window collapsed by a far-out-of-range current velocity still
    // yields one sampleable value
    (min, max.max(min))
}

#[inline]
fn step(min: f32, max: f32, samples: usize) -> f32 {
    (max - min) / (samples.saturating_sub(1).max(1)) as f32
}

/// Enumerate candidate (vx, vy, vtheta) samples for the current cycle.
///
/// Translating samples come first: the Cartesian product of the forward
/// window, the lateral list (0 plus `y_vels` on holonomic bases, just 0
/// otherwise), and the angular window. Pure in-place rotations follow,
/// with their magnitude floored at `min_in_place_rotational_vel`. The
/// backup sample is not part of this list; it is an escape action tried
/// by the planner only when everything here is infeasible.
pub(crate) fn generate_samples(
    limits: &LimitsConfig,
    sim: &SimConfig,
    current: &Velocity,
    osc: &OscillationState,
) -> Vec<Velocity> {
    let (min_vx, max_vx) = window(
        limits.min_vel_x,
        limits.max_vel_x,
        current.vx,
        limits.acc_lim_x,
        sim.sim_period,
        sim.dwa,
    );
    let (min_vth, max_vth) = window(
        -limits.max_rotational_vel,
        limits.max_rotational_vel,
        current.vtheta,
        limits.acc_lim_theta,
        sim.sim_period,
        sim.dwa,
    );

    let mut y_list = vec![0.0];
    if limits.holonomic_robot {
        y_list.extend_from_slice(&limits.y_vels);
    }

    let dvx = step(min_vx, max_vx, sim.vx_samples);
    let dvth = step(min_vth, max_vth, sim.vtheta_samples);

    let mut samples =
        Vec::with_capacity(sim.vx_samples * y_list.len() * sim.vtheta_samples + sim.vtheta_samples);

    for i in 0..sim.vx_samples {
        let vx = min_vx + dvx * i as f32;
        for &vy in &y_list {
            for j in 0..sim.vtheta_samples {
                let vth = min_vth + dvth * j as f32;
                let sample = Velocity::new(vx, vy, vth);
                if osc.allows(&sample) {
                    samples.push(sample);
                }
            }
        }
    }

    // Pure in-place rotations, floored to a velocity that actually
    // turns the base
    for j in 0..sim.vtheta_samples {
        let raw = min_vth + dvth * j as f32;
        let vth = if raw > 0.0 {
            raw.max(limits.min_in_place_rotational_vel)
        } else {
            raw.min(-limits.min_in_place_rotational_vel)
        };
        let sample = Velocity::new(0.0, 0.0, vth);
        if osc.allows(&sample) {
            samples.push(sample);
        }
    }

    samples
}

/// Oscillation and escape bookkeeping.
///
/// Direction locks keep the planner from flip-flopping between mirrored
/// in-place rotation or strafe samples on consecutive cycles; the
/// escaping flag suppresses forward samples while the robot backs away
/// from a dead end. Locks clear once the robot has physically moved away
/// from where they were taken.
#[derive(Clone, Debug, Default)]
pub struct OscillationState {
    rot_pos_blocked: bool,
    rot_neg_blocked: bool,
    strafe_pos_blocked: bool,
    strafe_neg_blocked: bool,
    escaping: bool,
    lock_pose: Option<Pose2D>,
    escape_pose: Option<Pose2D>,
}

impl OscillationState {
    /// Clear locks whose reset condition is met at the current pose.
    pub fn reset_if_moved(&mut self, pose: &Pose2D, cfg: &OscillationConfig) {
        if let Some(lock) = self.lock_pose {
            let moved = pose.position().distance_squared(&lock.position());
            if moved >= cfg.oscillation_reset_dist * cfg.oscillation_reset_dist {
                self.rot_pos_blocked = false;
                self.rot_neg_blocked = false;
                self.strafe_pos_blocked = false;
                self.strafe_neg_blocked = false;
                self.lock_pose = None;
            }
        }
        if let Some(escape) = self.escape_pose {
            let moved = pose.position().distance_squared(&escape.position());
            let turned = shortest_angular_distance(escape.theta, pose.theta).abs();
            if moved >= cfg.escape_reset_dist * cfg.escape_reset_dist
                || turned >= cfg.escape_reset_theta
            {
                self.escaping = false;
                self.escape_pose = None;
            }
        }
    }

    /// Record direction locks implied by the trajectory just selected.
    pub fn note_selection(&mut self, pose: &Pose2D, best: &Trajectory) {
        if best.vx == 0.0 && best.vy == 0.0 && best.vtheta != 0.0 {
            if best.vtheta > 0.0 {
                self.rot_neg_blocked = true;
            } else {
                self.rot_pos_blocked = true;
            }
            self.lock_pose = Some(*pose);
        } else if best.vy != 0.0 {
            if best.vy > 0.0 {
                self.strafe_neg_blocked = true;
            } else {
                self.strafe_pos_blocked = true;
            }
            self.lock_pose = Some(*pose);
        }
    }

    /// Record that the escape (backup) action was taken.
    pub fn note_escape(&mut self, pose: &Pose2D) {
        self.escaping = true;
        self.escape_pose = Some(*pose);
    }

    /// Whether a sample survives the current locks.
    pub fn allows(&self, sample: &Velocity) -> bool {
        if self.escaping && sample.vx > 0.0 {
            return false;
        }
        if sample.vx == 0.0 && sample.vy == 0.0 {
            if sample.vtheta > 0.0 && self.rot_pos_blocked {
                return false;
            }
            if sample.vtheta < 0.0 && self.rot_neg_blocked {
                return false;
            }
        }
        if sample.vy > 0.0 && self.strafe_pos_blocked {
            return false;
        }
        if sample.vy < 0.0 && self.strafe_neg_blocked {
            return false;
        }
        true
    }

    pub fn is_escaping(&self) -> bool {
        self.escaping
    }
}
