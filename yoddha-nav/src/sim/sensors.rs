//! Simulated sensor producer.
//!
//! Steps the arena at a fixed rate and publishes one scan, one opponent pose
//! and one camera frame per step, the way the robot drivers would.

use crossbeam_channel::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::arena::SimArena;
use crate::drivers::MarkerDetector;
use crate::error::Result;
use crate::shared::SharedState;
use crate::types::{EnemyObservation, MarkerBearings, RangeScan};

/// Camera frame as rendered by the simulator: the opponent carries a single
/// red marker, reported with its bearing when in view.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SimFrame {
    pub red_marker: Option<f32>,
}

/// Marker detector for [`SimFrame`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimMarkerDetector;

impl MarkerDetector for SimMarkerDetector {
    type Frame = SimFrame;

    fn detect(&mut self, frame: &SimFrame) -> MarkerBearings {
        MarkerBearings {
            red: frame.red_marker,
            ..Default::default()
        }
    }
}

/// Output channels of the simulated sensors.
pub struct SimSenders {
    pub scans: Sender<RangeScan>,
    pub enemy: Sender<EnemyObservation>,
    pub frames: Sender<SimFrame>,
}

impl SimSenders {
    /// Publish one step of sensor data. False once any consumer is gone.
    fn publish(&self, arena: &SimArena, now: Instant) -> bool {
        let (ex, ey) = arena.enemy_position();
        let frame = SimFrame {
            red_marker: arena.visible_enemy_bearing(),
        };

        self.scans.send(arena.scan()).is_ok()
            && self.enemy.send(EnemyObservation::new(now, ex, ey)).is_ok()
            && self.frames.send(frame).is_ok()
    }
}

/// Spawn the simulation thread.
///
/// Runs until shutdown is signalled or every consumer has hung up.
pub fn spawn_sim_sensors(
    arena: SimArena,
    shared_state: Arc<SharedState>,
    senders: SimSenders,
    rate_hz: f32,
) -> Result<JoinHandle<()>> {
    let period = Duration::from_secs_f32(1.0 / rate_hz.max(1.0));

    let handle = thread::Builder::new()
        .name("sim-sensors".into())
        .spawn(move || {
            tracing::info!("Sim sensors started at {:.0}Hz", 1.0 / period.as_secs_f32());
            let mut last = Instant::now();

            while !shared_state.should_shutdown() {
                let start = Instant::now();
                arena.step(start.duration_since(last).as_secs_f32(), start);
                last = start;

                if !senders.publish(&arena, start) {
                    tracing::warn!("Sim sensor consumers disconnected");
                    break;
                }

                let elapsed = start.elapsed();
                if elapsed < period {
                    thread::sleep(period - elapsed);
                }
            }

            let pose = arena.robot_pose();
            tracing::info!(
                "Sim sensors exited, robot at ({:.2}, {:.2}, {:.1}°)",
                pose.x,
                pose.y,
                pose.theta.to_degrees()
            );
        })?;

    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimConfig;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_detector_reports_red_only() {
        let mut detector = SimMarkerDetector;
        let bearings = detector.detect(&SimFrame {
            red_marker: Some(0.2),
        });
        assert_eq!(bearings.red, Some(0.2));
        assert_eq!(bearings.green, None);
        assert_eq!(bearings.blue, None);
    }

    #[test]
    fn test_sim_thread_publishes_and_stops() {
        let arena = SimArena::new(SimConfig::default());
        let shared = Arc::new(SharedState::new());
        let (scan_tx, scan_rx) = unbounded();
        let (enemy_tx, enemy_rx) = unbounded();
        let (frame_tx, frame_rx) = unbounded();

        let handle = spawn_sim_sensors(
            arena,
            Arc::clone(&shared),
            SimSenders {
                scans: scan_tx,
                enemy: enemy_tx,
                frames: frame_tx,
            },
            50.0,
        )
        .unwrap();

        let scan = scan_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(scan.len(), crate::types::RAYS_PER_SCAN);
        assert!(enemy_rx.recv_timeout(Duration::from_secs(2)).is_ok());
        assert!(frame_rx.recv_timeout(Duration::from_secs(2)).is_ok());

        shared.signal_shutdown();
        handle.join().unwrap();
    }

    #[test]
    fn test_sim_thread_exits_when_consumers_drop() {
        let arena = SimArena::new(SimConfig::default());
        let shared = Arc::new(SharedState::new());
        let (scan_tx, scan_rx) = unbounded();
        let (enemy_tx, _enemy_rx) = unbounded();
        let (frame_tx, _frame_rx) = unbounded();
        drop(scan_rx);

        let handle = spawn_sim_sensors(
            arena,
            shared,
            SimSenders {
                scans: scan_tx,
                enemy: enemy_tx,
                frames: frame_tx,
            },
            50.0,
        )
        .unwrap();

        handle.join().unwrap();
    }
}
