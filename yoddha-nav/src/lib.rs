//! YoddhaNav - decision core for a two-robot arena combat bot
//!
//! Each control tick fuses the latest inputs into a mode:
//!
//! - **Patrol**: cycle through waypoints via the navigation service
//! - **Engage**: steer straight at a confirmed, close opponent
//!
//! with a lidar collision guard that backs the robot off walls while patrolling.
//!
//! ## Threads
//!
//! - **Control thread** (~30Hz): snapshot inputs, decide mode, command motion
//! - **Feed threads**: scan, enemy pose and camera, each overwriting its slot
//!   in [`SharedState`]
//!
//! Middleware is reached through the traits in [`drivers`]; [`sim`] provides
//! an in-process arena implementing all of them.

pub mod behavior;
pub mod config;
pub mod drivers;
pub mod error;
pub mod perception;
pub mod shared;
pub mod sim;
pub mod threads;
pub mod types;
pub mod utils;

pub use behavior::{Mode, MotionCommander, Waypoint, WaypointCycle};
pub use config::YoddhaConfig;
pub use error::{Result, YoddhaError};
pub use shared::{InputSnapshot, SharedState};
pub use types::{CameraSignal, EnemyObservation, MarkerBearings, Pose2D, RangeScan, Twist};
