//! Planar pose and point types.
//!
//! Coordinates follow the REP-103 convention: x forward, y left, theta
//! counter-clockwise from +x in radians.

use serde::{Deserialize, Serialize};

use super::math::normalize_angle;

/// A 2D point in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Squared distance to another point (avoids sqrt).
    #[inline]
    pub fn distance_squared(&self, other: &Point2D) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    #[inline]
    pub fn distance(&self, other: &Point2D) -> f32 {
        self.distance_squared(other).sqrt()
    }
}

/// Robot pose: position (x, y) in meters and heading in radians.
///
/// Theta is normalized to [-π, π] on construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose2D {
    pub x: f32,
    pub y: f32,
    pub theta: f32,
}

impl Pose2D {
    #[inline]
    pub fn new(x: f32, y: f32, theta: f32) -> Self {
        Self {
            x,
            y,
            theta: normalize_angle(theta),
        }
    }

    /// Identity pose at the origin.
    #[inline]
    pub fn identity() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            theta: 0.0,
        }
    }

    #[inline]
    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    /// Compose two poses: apply `other` in the frame of `self`.
    #[inline]
    pub fn compose(&self, other: &Pose2D) -> Pose2D {
        let (sin_t, cos_t) = self.theta.sin_cos();
        Pose2D::new(
            self.x + other.x * cos_t - other.y * sin_t,
            self.y + other.x * sin_t + other.y * cos_t,
            self.theta + other.theta,
        )
    }

    /// The transform that undoes this pose.
    #[inline]
    pub fn inverse(&self) -> Pose2D {
        let (sin_t, cos_t) = self.theta.sin_cos();
        Pose2D::new(
            -self.x * cos_t - self.y * sin_t,
            self.x * sin_t - self.y * cos_t,
            -self.theta,
        )
    }

    /// Transform a point from this pose's frame into the parent frame.
    #[inline]
    pub fn transform_point(&self, point: &Point2D) -> Point2D {
        let (sin_t, cos_t) = self.theta.sin_cos();
        Point2D::new(
            self.x + point.x * cos_t - point.y * sin_t,
            self.y + point.x * sin_t + point.y * cos_t,
        )
    }

    /// Transform a point from the parent frame into this pose's frame.
    #[inline]
    pub fn inverse_transform_point(&self, point: &Point2D) -> Point2D {
        let (sin_t, cos_t) = self.theta.sin_cos();
        let dx = point.x - self.x;
        let dy = point.y - self.y;
        Point2D::new(dx * cos_t + dy * sin_t, -dx * sin_t + dy * cos_t)
    }
}

impl Default for Pose2D {
    fn default() -> Self {
        Self::identity()
    }
}

/// A pose tagged with the frame it is expressed in and an acquisition
/// time in microseconds. A stamp of 0 means "latest available".
///
/// Global plans are sequences of stamped poses; the last element is the
/// goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampedPose {
    pub pose: Pose2D,
    pub frame_id: String,
    pub stamp_us: u64,
}

impl StampedPose {
    pub fn new(pose: Pose2D, frame_id: impl Into<String>, stamp_us: u64) -> Self {
        Self {
            pose,
            frame_id: frame_id.into(),
            stamp_us,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_point_distance() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(3.0, 4.0);
        assert_relative_eq!(a.distance(&b), 5.0);
        assert_relative_eq!(a.distance_squared(&b), 25.0);
    }

    #[test]
    fn test_compose_identity() {
        let p = Pose2D::new(1.0, 2.0, 0.5);
        let result = p.compose(&Pose2D::identity());
        assert_relative_eq!(result.x, p.x);
        assert_relative_eq!(result.y, p.y);
        assert_relative_eq!(result.theta, p.theta);
    }

    #[test]
    fn test_inverse_roundtrip() {
        let p = Pose2D::new(1.0, 2.0, 0.5);
        let back = p.compose(&p.inverse());
        assert_relative_eq!(back.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(back.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(back.theta, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_transform_point_rotated_frame() {
        let pose = Pose2D::new(1.0, 0.0, FRAC_PI_2);
        let p = pose.transform_point(&Point2D::new(1.0, 0.0));
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_inverse_transform_point() {
        let pose = Pose2D::new(1.0, 0.0, FRAC_PI_2);
        let local = pose.inverse_transform_point(&Point2D::new(1.0, 1.0));
        assert_relative_eq!(local.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(local.y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_theta_normalized_on_construction() {
        let p = Pose2D::new(0.0, 0.0, 3.0 * std::f32::consts::PI);
        assert_relative_eq!(p.theta, std::f32::consts::PI, epsilon = 1e-6);
    }
}
