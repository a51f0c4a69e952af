//! Feed threads: one producer per input stream.
//!
//! Each thread drains its channel and writes the newest message into its
//! slot of the shared state. Older messages queued behind it are dropped.

use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::drivers::MarkerDetector;
use crate::error::Result;
use crate::shared::SharedState;
use crate::types::{EnemyObservation, RangeScan};

/// How often an idle feed re-checks the shutdown flag.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Spawn the range scan feed.
pub fn spawn_scan_feed(
    shared_state: Arc<SharedState>,
    rx: Receiver<RangeScan>,
) -> Result<JoinHandle<()>> {
    spawn_feed("scan-feed", shared_state, rx, |state, scan| state.set_scan(scan))
}

/// Spawn the enemy position feed.
pub fn spawn_enemy_feed(
    shared_state: Arc<SharedState>,
    rx: Receiver<EnemyObservation>,
) -> Result<JoinHandle<()>> {
    spawn_feed("enemy-feed", shared_state, rx, |state, observation| {
        state.set_enemy(observation)
    })
}

/// Spawn the camera feed, running the marker detector on the newest frame.
pub fn spawn_camera_feed<D>(
    shared_state: Arc<SharedState>,
    rx: Receiver<D::Frame>,
    mut detector: D,
) -> Result<JoinHandle<()>>
where
    D: MarkerDetector + 'static,
    D::Frame: 'static,
{
    spawn_feed("camera-feed", shared_state, rx, move |state, frame| {
        let signal = detector.detect(&frame).to_signal();
        state.set_camera(signal);
    })
}

fn spawn_feed<M, F>(
    name: &str,
    shared_state: Arc<SharedState>,
    rx: Receiver<M>,
    mut apply: F,
) -> Result<JoinHandle<()>>
where
    M: Send + 'static,
    F: FnMut(&SharedState, M) + Send + 'static,
{
    let thread_name = name.to_string();
    let handle = thread::Builder::new()
        .name(thread_name.clone())
        .spawn(move || {
            tracing::info!("{} started", thread_name);

            loop {
                if shared_state.should_shutdown() {
                    break;
                }

                match rx.recv_timeout(SHUTDOWN_POLL) {
                    Ok(msg) => {
                        let latest = rx.try_iter().last().unwrap_or(msg);
                        apply(&shared_state, latest);
                    }
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => {
                        tracing::warn!("{} source disconnected", thread_name);
                        break;
                    }
                }
            }

            tracing::info!("{} exited", thread_name);
        })?;

    Ok(handle)
}
