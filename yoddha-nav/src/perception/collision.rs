//! Wall proximity check from the range scan.
//!
//! Looks at three rays on each end of the robot and flags a side as blocked
//! when any of them reports a wall closer than the threshold.

use crate::types::{RangeScan, Twist};

/// Rays (degrees) watched for the front arc.
pub const FRONT_RAYS: [usize; 3] = [0, 10, 350];

/// Rays (degrees) watched for the rear arc.
pub const REAR_RAYS: [usize; 3] = [170, 180, 190];

/// Which ends of the robot are close to a wall.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollisionStatus {
    pub front: bool,
    pub rear: bool,
}

impl CollisionStatus {
    pub const CLEAR: CollisionStatus = CollisionStatus {
        front: false,
        rear: false,
    };

    pub fn any(&self) -> bool {
        self.front || self.rear
    }

    /// Straight-line move away from the blocked side, front taking precedence.
    pub fn recovery_velocity(&self, speed: f32) -> Option<Twist> {
        if self.front {
            Some(Twist::new(-speed, 0.0))
        } else if self.rear {
            Some(Twist::new(speed, 0.0))
        } else {
            None
        }
    }
}

/// Stateless wall proximity check.
#[derive(Clone, Copy, Debug)]
pub struct CollisionGuard {
    distance_to_wall_th: f32,
}

impl CollisionGuard {
    pub fn new(distance_to_wall_th: f32) -> Self {
        Self {
            distance_to_wall_th,
        }
    }

    /// Check the latest scan. No scan yet means no collision.
    pub fn check(&self, scan: Option<&RangeScan>) -> CollisionStatus {
        let Some(scan) = scan else {
            return CollisionStatus::CLEAR;
        };

        let status = CollisionStatus {
            front: self.arc_blocked(scan, &FRONT_RAYS),
            rear: self.arc_blocked(scan, &REAR_RAYS),
        };

        if status.front {
            tracing::warn!("Front collision");
        }
        if status.rear {
            tracing::warn!("Rear collision");
        }

        status
    }

    fn arc_blocked(&self, scan: &RangeScan, rays: &[usize]) -> bool {
        // Zero readings are "no echo", range_at filters them out
        rays.iter()
            .filter_map(|&deg| scan.range_at(deg))
            .any(|r| r < self.distance_to_wall_th)
    }
}
