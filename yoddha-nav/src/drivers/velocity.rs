//! Velocity output trait

use crate::types::Twist;

/// Direct velocity command sink, bypassing the navigation service.
pub trait VelocityPublisher: Send {
    fn publish(&mut self, cmd: Twist);
}
