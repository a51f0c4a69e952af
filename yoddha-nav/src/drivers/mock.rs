//! Recording mock drivers for testing
//!
//! All handles are cheap clones over shared state, so a test keeps one clone
//! for inspection while the control loop owns another.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;

use super::{
    GoalState, MarkerDetector, NavGoal, NavigationClient, TransformError, TransformProvider,
    VelocityPublisher,
};
use crate::types::{MarkerBearings, Pose2D, Twist};

/// One outbound call made by the control loop.
#[derive(Clone, Debug, PartialEq)]
pub enum DriverCall {
    Submit(NavGoal),
    CancelAll,
    Publish(Twist),
}

/// Ordered log of outbound calls shared by the mock navigation and velocity
/// drivers.
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<DriverCall>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, call: DriverCall) {
        self.calls.lock().push(call);
    }

    /// Remove and return every call recorded so far.
    pub fn take(&self) -> Vec<DriverCall> {
        std::mem::take(&mut *self.calls.lock())
    }

    /// Copy of every call recorded so far.
    pub fn calls(&self) -> Vec<DriverCall> {
        self.calls.lock().clone()
    }

    pub fn submitted_goals(&self) -> Vec<NavGoal> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                DriverCall::Submit(goal) => Some(goal.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn published(&self) -> Vec<Twist> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                DriverCall::Publish(cmd) => Some(*cmd),
                _ => None,
            })
            .collect()
    }
}

/// Navigation client whose goal state is scripted by the test.
#[derive(Clone)]
pub struct MockNavigation {
    state: Arc<Mutex<GoalState>>,
    log: CallLog,
}

impl MockNavigation {
    pub fn new(log: CallLog) -> Self {
        Self {
            state: Arc::new(Mutex::new(GoalState::Lost)),
            log,
        }
    }

    /// Set the state reported by subsequent polls.
    pub fn set_state(&self, state: GoalState) {
        *self.state.lock() = state;
    }
}

impl NavigationClient for MockNavigation {
    fn submit(&mut self, goal: &NavGoal) {
        self.log.push(DriverCall::Submit(goal.clone()));
    }

    fn cancel_all(&mut self) {
        self.log.push(DriverCall::CancelAll);
    }

    fn state(&self) -> GoalState {
        *self.state.lock()
    }
}

/// Velocity publisher recording into a [`CallLog`].
#[derive(Clone)]
pub struct MockVelocity {
    log: CallLog,
}

impl MockVelocity {
    pub fn new(log: CallLog) -> Self {
        Self { log }
    }
}

impl VelocityPublisher for MockVelocity {
    fn publish(&mut self, cmd: Twist) {
        self.log.push(DriverCall::Publish(cmd));
    }
}

/// Transform provider returning a settable pose or error.
#[derive(Clone)]
pub struct MockTransform {
    result: Arc<Mutex<Result<Pose2D, TransformError>>>,
    last_lookup: Arc<Mutex<Option<(String, String)>>>,
}

impl MockTransform {
    pub fn new(pose: Pose2D) -> Self {
        Self {
            result: Arc::new(Mutex::new(Ok(pose))),
            last_lookup: Arc::new(Mutex::new(None)),
        }
    }

    pub fn set_pose(&self, pose: Pose2D) {
        *self.result.lock() = Ok(pose);
    }

    pub fn set_error(&self, error: TransformError) {
        *self.result.lock() = Err(error);
    }

    /// `(target_frame, source_frame)` of the most recent lookup.
    pub fn last_lookup(&self) -> Option<(String, String)> {
        self.last_lookup.lock().clone()
    }
}

impl TransformProvider for MockTransform {
    fn lookup(
        &self,
        target_frame: &str,
        source_frame: &str,
        _at: Option<Instant>,
    ) -> Result<Pose2D, TransformError> {
        *self.last_lookup.lock() = Some((target_frame.to_string(), source_frame.to_string()));
        self.result.lock().clone()
    }
}

/// Detector whose frames already carry the per-colour bearings.
#[derive(Clone, Copy, Debug, Default)]
pub struct MockDetector;

impl MarkerDetector for MockDetector {
    type Frame = MarkerBearings;

    fn detect(&mut self, frame: &MarkerBearings) -> MarkerBearings {
        *frame
    }
}
