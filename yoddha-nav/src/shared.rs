//! Shared state between the feed threads and the control thread.
//!
//! Each input stream owns one slot and overwrites it on arrival (last value
//! wins). Slots are locked individually and only for the copy in or out, so a
//! feed never waits on a full control tick.

use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::types::{CameraSignal, EnemyObservation, RangeScan};

/// Copy of every input slot, taken once at the start of a control tick.
#[derive(Clone, Debug, Default)]
pub struct InputSnapshot {
    pub scan: Option<Arc<RangeScan>>,
    pub enemy: Option<EnemyObservation>,
    pub camera: Option<CameraSignal>,
}

/// Latest sensor inputs plus lifecycle flags.
#[derive(Debug, Default)]
pub struct SharedState {
    /// Latest range scan (written by the scan feed)
    scan: RwLock<Option<Arc<RangeScan>>>,

    /// Latest enemy position (written by the enemy feed)
    enemy: RwLock<Option<EnemyObservation>>,

    /// Latest camera verdict (written by the camera feed)
    camera: RwLock<Option<CameraSignal>>,

    /// Shutdown signal for graceful termination
    shutdown: AtomicBool,

    /// Arrival counters for status reporting
    scan_count: AtomicU64,
    enemy_count: AtomicU64,
    frame_count: AtomicU64,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the latest range scan.
    pub fn set_scan(&self, scan: RangeScan) {
        let scan = Arc::new(scan);
        *self.scan.write() = Some(scan);
        self.scan_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Replace the latest enemy observation.
    pub fn set_enemy(&self, observation: EnemyObservation) {
        *self.enemy.write() = Some(observation);
        self.enemy_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Replace the latest camera signal.
    pub fn set_camera(&self, signal: CameraSignal) {
        *self.camera.write() = Some(signal);
        self.frame_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all input slots.
    pub fn snapshot(&self) -> InputSnapshot {
        InputSnapshot {
            scan: self.scan.read().clone(),
            enemy: *self.enemy.read(),
            camera: *self.camera.read(),
        }
    }

    /// Signal shutdown.
    pub fn signal_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    /// Check if shutdown is signaled.
    pub fn should_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Arrival counts (scans, enemy observations, camera frames).
    pub fn input_counts(&self) -> (u64, u64, u64) {
        (
            self.scan_count.load(Ordering::Relaxed),
            self.enemy_count.load(Ordering::Relaxed),
            self.frame_count.load(Ordering::Relaxed),
        )
    }
}
