//! Pose and velocity types

/// 2D pose in a planar frame.
///
/// `x`, `y` in meters, `theta` in radians (CCW from +X).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pose2D {
    pub x: f32,
    pub y: f32,
    pub theta: f32,
}

impl Pose2D {
    pub fn new(x: f32, y: f32, theta: f32) -> Self {
        Self { x, y, theta }
    }

    /// Euclidean distance to a point.
    pub fn distance_to(&self, x: f32, y: f32) -> f32 {
        (x - self.x).hypot(y - self.y)
    }
}

/// Velocity command for a differential drive base.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Twist {
    /// Forward velocity in m/s (negative = reverse)
    pub linear: f32,
    /// Angular velocity in rad/s (positive = counter-clockwise)
    pub angular: f32,
}

impl Twist {
    pub const ZERO: Twist = Twist {
        linear: 0.0,
        angular: 0.0,
    };

    pub fn new(linear: f32, angular: f32) -> Self {
        Self { linear, angular }
    }
}
