//! Body-frame velocity command type.

use serde::{Deserialize, Serialize};

/// A velocity expressed in the robot base frame.
///
/// `vx` is forward, `vy` is lateral (left positive, meaningful only for
/// holonomic bases), `vtheta` is counter-clockwise rotation. This is
/// both the odometry sample the planner consumes and the command it
/// emits.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity {
    /// Forward velocity (m/s)
    pub vx: f32,
    /// Lateral velocity (m/s)
    pub vy: f32,
    /// Angular velocity (rad/s)
    pub vtheta: f32,
}

impl Velocity {
    #[inline]
    pub fn new(vx: f32, vy: f32, vtheta: f32) -> Self {
        Self { vx, vy, vtheta }
    }

    #[inline]
    pub fn zero() -> Self {
        Self::default()
    }

    /// Translational speed magnitude.
    #[inline]
    pub fn linear_magnitude(&self) -> f32 {
        self.vx.hypot(self.vy)
    }

    /// True when every component is inside the stopped band.
    #[inline]
    pub fn is_stopped(&self, trans_tolerance: f32, rot_tolerance: f32) -> bool {
        self.vtheta.abs() <= rot_tolerance
            && self.vx.abs() <= trans_tolerance
            && self.vy.abs() <= trans_tolerance
    }
}
