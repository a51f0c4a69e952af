//! Sensor data carried by the input feeds.

use std::time::Instant;

/// Number of rays in a dense one-per-degree scan.
pub const RAYS_PER_SCAN: usize = 360;

/// Dense range scan, one reading per integer degree (index 0 = straight ahead,
/// increasing counter-clockwise).
///
/// A reading of zero means the ray had no echo.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RangeScan {
    pub ranges: Vec<f32>,
}

impl RangeScan {
    pub fn new(ranges: Vec<f32>) -> Self {
        Self { ranges }
    }

    /// Full scan with the same reading on every ray.
    pub fn uniform(distance: f32) -> Self {
        Self {
            ranges: vec![distance; RAYS_PER_SCAN],
        }
    }

    /// Valid return on the ray at `degree`.
    ///
    /// `None` when the ray is missing from the scan, had no echo (zero) or is
    /// not a finite number.
    pub fn range_at(&self, degree: usize) -> Option<f32> {
        self.ranges
            .get(degree)
            .copied()
            .filter(|r| r.is_finite() && *r != 0.0)
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Latest enemy position estimate from the enemy-pose feed (map frame).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyObservation {
    pub stamp: Instant,
    pub x: f32,
    pub y: f32,
}

impl EnemyObservation {
    pub fn new(stamp: Instant, x: f32, y: f32) -> Self {
        Self { stamp, x, y }
    }
}

/// Camera corroboration state derived from the most recent frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CameraSignal {
    /// Bearing to the detected marker (radians), `None` when nothing was seen
    pub bearing: Option<f32>,
}

impl CameraSignal {
    pub const ABSENT: CameraSignal = CameraSignal { bearing: None };

    pub fn seen(bearing: f32) -> Self {
        Self {
            bearing: Some(bearing),
        }
    }

    pub fn is_present(&self) -> bool {
        self.bearing.is_some()
    }
}

/// Per-colour marker bearings reported by the camera detector.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MarkerBearings {
    pub red: Option<f32>,
    pub green: Option<f32>,
    pub blue: Option<f32>,
}

impl MarkerBearings {
    /// Collapse the channels into one signal, first present channel wins
    /// (red, then green, then blue).
    pub fn to_signal(&self) -> CameraSignal {
        CameraSignal {
            bearing: self.red.or(self.green).or(self.blue),
        }
    }
}
