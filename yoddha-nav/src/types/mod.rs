//! Core data types shared by perception, behavior and the drivers.

mod motion;
mod sensors;

pub use motion::{Pose2D, Twist};
pub use sensors::{CameraSignal, EnemyObservation, MarkerBearings, RAYS_PER_SCAN, RangeScan};
