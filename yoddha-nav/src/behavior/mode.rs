//! Behavior mode selection.

use std::fmt;
use std::mem::discriminant;

use crate::perception::Detection;

/// What the robot is doing this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Mode {
    /// Follow the waypoint route through the navigation service
    Patrol,
    /// Drive directly at a nearby enemy
    Engage {
        /// Distance to the enemy (meters)
        distance: f32,
        /// Bearing to the enemy relative to the robot heading (radians)
        bearing: f32,
    },
    /// Reserved, performs no actuation
    Retreat,
    /// Reserved, performs no actuation
    Guard,
}

impl Mode {
    /// True when both modes are the same variant, ignoring the engage target.
    pub fn same_kind(&self, other: &Mode) -> bool {
        discriminant(self) == discriminant(other)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mode::Patrol => "patrol",
            Mode::Engage { .. } => "engage",
            Mode::Retreat => "retreat",
            Mode::Guard => "guard",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Choose the mode from this tick's detection.
///
/// A confirmed enemy closer than `snipe_th` is engaged; anything else keeps
/// the robot on patrol, including a confirmed enemy that is too far away.
pub fn decide_mode(detection: &Detection, snipe_th: f32) -> Mode {
    if !detection.present {
        return Mode::Patrol;
    }

    if detection.distance < snipe_th {
        Mode::Engage {
            distance: detection.distance,
            bearing: detection.bearing,
        }
    } else {
        tracing::debug!(
            "Enemy detected at {:.2}m, beyond engage range {:.2}m",
            detection.distance,
            snipe_th
        );
        Mode::Patrol
    }
}
