//! Mode decision, patrol route and motion command generation.

mod commander;
mod mode;
mod waypoints;

pub use commander::{CommanderConfig, MotionCommander};
pub use mode::{Mode, decide_mode};
pub use waypoints::{Waypoint, WaypointCycle};
