//! Cyclic patrol route.

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;
use std::io;
use std::path::Path;

use crate::error::{Result, YoddhaError};
use crate::types::Pose2D;

/// Patrol target in the map frame.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct Waypoint {
    pub x: f32,
    pub y: f32,
    /// Final heading in radians
    #[serde(default)]
    pub heading: f32,
}

impl Waypoint {
    pub fn new(x: f32, y: f32, heading: f32) -> Self {
        Self { x, y, heading }
    }

    pub fn to_pose(self) -> Pose2D {
        Pose2D::new(self.x, self.y, self.heading)
    }
}

/// Ordered, wrapping sequence of waypoints.
///
/// The route is fixed after construction; only the cursor moves and it always
/// points at a valid element.
#[derive(Clone, Debug)]
pub struct WaypointCycle {
    points: Vec<Waypoint>,
    cursor: usize,
}

impl WaypointCycle {
    /// Create a cycle starting at the first point. Fails on an empty route.
    pub fn new(points: Vec<Waypoint>) -> Result<Self> {
        if points.is_empty() {
            return Err(YoddhaError::Waypoint("patrol route is empty".into()));
        }
        Ok(Self { points, cursor: 0 })
    }

    /// Load a route from a CSV file of `x,y[,heading]` rows.
    pub fn from_csv(path: &Path) -> Result<Self> {
        let reader = csv_reader().from_path(path).map_err(|e| {
            YoddhaError::Waypoint(format!("Failed to open {}: {}", path.display(), e))
        })?;
        let points = read_points(reader)?;
        tracing::info!("Loaded {} waypoints from {:?}", points.len(), path);
        Self::new(points)
    }

    /// Waypoint under the cursor.
    pub fn current(&self) -> Waypoint {
        self.points[self.cursor]
    }

    /// Move to the next waypoint, wrapping after the last, and return it.
    pub fn advance(&mut self) -> Waypoint {
        self.cursor = (self.cursor + 1) % self.points.len();
        self.current()
    }

    pub fn index(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Reader for route files: `#` comments, padded fields and an optional
/// header row.
fn csv_reader() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .flexible(true);
    builder
}

/// Deserialize every row into a [`Waypoint`]. The first non-empty row is
/// skipped when it is not numeric (a header); a missing heading defaults to 0.
fn read_points<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<Waypoint>> {
    let mut points = Vec::new();
    let mut seen_row = false;

    for (row, result) in reader.records().enumerate() {
        let record = result.map_err(|e| YoddhaError::Waypoint(e.to_string()))?;
        let line = record.position().map_or(row as u64 + 1, |p| p.line());

        if record.iter().all(str::is_empty) {
            continue;
        }
        let had_row = std::mem::replace(&mut seen_row, true);
        if !had_row && is_header(&record) {
            continue;
        }
        if !(2..=3).contains(&record.len()) {
            return Err(YoddhaError::Waypoint(format!(
                "line {}: expected x,y[,heading], got {} fields",
                line,
                record.len()
            )));
        }

        let point: Waypoint = record
            .deserialize(None)
            .map_err(|e| YoddhaError::Waypoint(format!("line {}: {}", line, e)))?;
        points.push(point);
    }

    Ok(points)
}

fn is_header(record: &StringRecord) -> bool {
    record.get(0).is_some_and(|f| f.parse::<f32>().is_err())
}
