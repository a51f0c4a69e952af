//! Navigation service client trait

use std::fmt;
use std::time::Instant;

use crate::types::Pose2D;

/// Lifecycle state of the most recent navigation goal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GoalState {
    /// Accepted, not yet being executed
    Pending,
    /// Being executed
    Active,
    /// Cancelled after execution started
    Preempted,
    /// Reached
    Succeeded,
    /// Execution failed
    Aborted,
    /// Refused without execution
    Rejected,
    /// Cancel requested after execution started
    Preempting,
    /// Cancel requested before execution started
    Recalling,
    /// Cancelled before execution started
    Recalled,
    /// No goal known to the service
    Lost,
}

impl fmt::Display for GoalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GoalState::Pending => "PENDING",
            GoalState::Active => "ACTIVE",
            GoalState::Preempted => "PREEMPTED",
            GoalState::Succeeded => "SUCCEEDED",
            GoalState::Aborted => "ABORTED",
            GoalState::Rejected => "REJECTED",
            GoalState::Preempting => "PREEMPTING",
            GoalState::Recalling => "RECALLING",
            GoalState::Recalled => "RECALLED",
            GoalState::Lost => "LOST",
        };
        f.write_str(name)
    }
}

/// Target pose handed to the navigation service.
#[derive(Clone, Debug, PartialEq)]
pub struct NavGoal {
    pub frame_id: String,
    pub pose: Pose2D,
    pub stamp: Instant,
}

/// Client handle for an asynchronous navigation service.
///
/// Calls are fire-and-forget; progress is observed by polling [`state`].
///
/// [`state`]: NavigationClient::state
pub trait NavigationClient: Send {
    /// Send a new goal, replacing any goal in flight.
    fn submit(&mut self, goal: &NavGoal);

    /// Cancel every outstanding goal.
    fn cancel_all(&mut self);

    /// Current state of the latest goal.
    fn state(&self) -> GoalState;

    /// Human readable status for the latest goal, if the service provides one.
    fn status_text(&self) -> Option<String> {
        None
    }
}
