//! Control thread: fixed-rate mode decision and motion commands.
//!
//! Each tick snapshots the input slots, runs the commander once and sleeps
//! out the rest of the period. Nothing inside a tick blocks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::behavior::{Mode, MotionCommander};
use crate::drivers::{NavigationClient, TransformProvider, VelocityPublisher};
use crate::shared::SharedState;

/// Control thread state and logic.
pub struct ControlThread<N, T, V> {
    shared_state: Arc<SharedState>,
    commander: MotionCommander<N, T, V>,
    period: Duration,
    last_status_time: Instant,
    status_interval: Duration,
    tick_count: u64,
    overruns: u64,
}

impl<N, T, V> ControlThread<N, T, V>
where
    N: NavigationClient,
    T: TransformProvider,
    V: VelocityPublisher,
{
    /// Create a new control thread.
    pub fn new(
        shared_state: Arc<SharedState>,
        commander: MotionCommander<N, T, V>,
        period: Duration,
    ) -> Self {
        Self {
            shared_state,
            commander,
            period,
            last_status_time: Instant::now(),
            status_interval: Duration::from_secs(3),
            tick_count: 0,
            overruns: 0,
        }
    }

    /// Run the control loop until shutdown is signaled.
    pub fn run(&mut self) {
        tracing::info!(
            "Control thread started ({:.0} Hz)",
            1.0 / self.period.as_secs_f32()
        );

        self.commander.start(Instant::now());

        loop {
            let loop_start = Instant::now();

            if self.shared_state.should_shutdown() {
                tracing::info!("Control thread shutting down");
                break;
            }

            let inputs = self.shared_state.snapshot();
            let mode = self.commander.tick(loop_start, &inputs);
            self.tick_count += 1;

            if self.last_status_time.elapsed() >= self.status_interval {
                self.log_status(mode);
                self.last_status_time = Instant::now();
            }

            // Maintain target loop rate
            let elapsed = loop_start.elapsed();
            if elapsed < self.period {
                std::thread::sleep(self.period - elapsed);
            } else {
                self.overruns += 1;
                tracing::debug!(
                    "Tick took {:.1}ms, period is {:.1}ms",
                    elapsed.as_secs_f32() * 1000.0,
                    self.period.as_secs_f32() * 1000.0
                );
            }
        }

        self.commander.stop();
        tracing::info!(
            "Control thread exited after {} ticks ({} overruns)",
            self.tick_count,
            self.overruns
        );
    }

    fn log_status(&self, mode: Mode) {
        let (scans, enemies, frames) = self.shared_state.input_counts();
        let route = self.commander.waypoints();
        tracing::info!(
            "Status: mode={}, waypoint={}/{}, debounce={}, inputs: scans={}, enemy={}, frames={}",
            mode,
            route.index() + 1,
            route.len(),
            self.commander.detector().counter(),
            scans,
            enemies,
            frames
        );
    }
}
