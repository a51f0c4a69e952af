//! Camera marker detector trait

use crate::types::MarkerBearings;

/// Finds the enemy's coloured markers in a camera frame.
///
/// Image processing is outside this crate; implementations wrap whatever
/// vision pipeline the robot runs.
pub trait MarkerDetector: Send {
    /// Raw frame type delivered by the camera feed
    type Frame: Send;

    /// Bearing (radians, positive to the left) per colour channel.
    fn detect(&mut self, frame: &Self::Frame) -> MarkerBearings;
}
