//! Kinematic arena simulation.
//!
//! Stands in for the robot middleware so the control loop can run end to end:
//! a square arena with one orbiting opponent, a navigation service that
//! drives straight to its goal, and sensor feeds derived from the geometry.

mod arena;
mod sensors;

pub use arena::{SimArena, SimConfig, SimNavigation, SimTransform, SimVelocity};
pub use sensors::{SimFrame, SimMarkerDetector, SimSenders, spawn_sim_sensors};
