//! Angular arithmetic used throughout the planner.

use std::f32::consts::PI;

/// Normalize an angle to [-π, π].
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    let mut a = angle % (2.0 * PI);
    if a > PI {
        a -= 2.0 * PI;
    } else if a < -PI {
        a += 2.0 * PI;
    }
    a
}

/// Signed shortest rotation from angle `from` to angle `to`.
///
/// The result is in (-π, π]; adding it to `from` reaches `to` by the
/// short way around the circle.
#[inline]
pub fn shortest_angular_distance(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}
