//! Narrow interfaces to the collaborators around the control loop.
//!
//! The navigation service, transform tree, velocity output and camera marker
//! detector live outside this crate. Each is reached through one trait so the
//! control loop can run against real middleware, the simulator or test mocks.

mod camera;
pub mod mock;
mod navigation;
mod transform;
mod velocity;

pub use camera::MarkerDetector;
pub use navigation::{GoalState, NavGoal, NavigationClient};
pub use transform::{TransformError, TransformProvider};
pub use velocity::VelocityPublisher;
