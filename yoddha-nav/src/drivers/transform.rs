//! Coordinate transform lookup trait

use std::time::Instant;
use thiserror::Error;

use crate::types::Pose2D;

/// Why a transform could not be resolved.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("transform lookup failed: {0}")]
    Lookup(String),

    #[error("frames not connected: {0}")]
    Connectivity(String),

    #[error("extrapolation outside buffered data: {0}")]
    Extrapolation(String),
}

/// Resolves where one frame sits inside another.
pub trait TransformProvider: Send {
    /// Pose of `source_frame` expressed in `target_frame`.
    ///
    /// `at` selects the time of the transform, `None` for the latest available.
    fn lookup(
        &self,
        target_frame: &str,
        source_frame: &str,
        at: Option<Instant>,
    ) -> Result<Pose2D, TransformError>;
}
