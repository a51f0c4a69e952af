//! Multi-threaded architecture for YoddhaNav.
//!
//! - Control thread (~30Hz): mode decision and motion commands
//! - Scan, enemy and camera feed threads: overwrite their shared slot on arrival

mod control;
mod feeds;

pub use control::ControlThread;
pub use feeds::{spawn_camera_feed, spawn_enemy_feed, spawn_scan_feed};

use crossbeam_channel::Receiver;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::behavior::MotionCommander;
use crate::config::YoddhaConfig;
use crate::drivers::{MarkerDetector, NavigationClient, TransformProvider, VelocityPublisher};
use crate::error::Result;
use crate::shared::SharedState;
use crate::types::{EnemyObservation, RangeScan};

/// Input channels consumed by the feed threads.
pub struct FeedReceivers<F> {
    pub scans: Receiver<RangeScan>,
    pub enemy: Receiver<EnemyObservation>,
    pub frames: Receiver<F>,
}

/// Thread handles for the multi-threaded system.
pub struct ThreadHandles {
    pub control: JoinHandle<()>,
    pub scan_feed: JoinHandle<()>,
    pub enemy_feed: JoinHandle<()>,
    pub camera_feed: JoinHandle<()>,
}

impl ThreadHandles {
    /// True if any worker has exited.
    pub fn any_finished(&self) -> bool {
        self.control.is_finished()
            || self.scan_feed.is_finished()
            || self.enemy_feed.is_finished()
            || self.camera_feed.is_finished()
    }

    /// Join every worker, logging panics.
    pub fn join(self) {
        for (name, handle) in [
            ("Control", self.control),
            ("Scan feed", self.scan_feed),
            ("Enemy feed", self.enemy_feed),
            ("Camera feed", self.camera_feed),
        ] {
            if let Err(e) = handle.join() {
                tracing::error!("{} thread panicked: {:?}", name, e);
            }
        }
    }
}

/// Spawn the control thread and the three feed threads.
pub fn spawn_threads<N, T, V, D>(
    config: &YoddhaConfig,
    shared_state: Arc<SharedState>,
    commander: MotionCommander<N, T, V>,
    detector: D,
    feeds: FeedReceivers<D::Frame>,
) -> Result<ThreadHandles>
where
    N: NavigationClient + 'static,
    T: TransformProvider + 'static,
    V: VelocityPublisher + 'static,
    D: MarkerDetector + 'static,
    D::Frame: 'static,
{
    let scan_feed = spawn_scan_feed(Arc::clone(&shared_state), feeds.scans)?;
    let enemy_feed = spawn_enemy_feed(Arc::clone(&shared_state), feeds.enemy)?;
    let camera_feed = spawn_camera_feed(Arc::clone(&shared_state), feeds.frames, detector)?;

    let period = config.motion.control_period();
    let control = thread::Builder::new()
        .name("control".into())
        .spawn(move || {
            let mut control_thread = ControlThread::new(shared_state, commander, period);
            control_thread.run();
        })?;

    Ok(ThreadHandles {
        control,
        scan_feed,
        enemy_feed,
        camera_feed,
    })
}
