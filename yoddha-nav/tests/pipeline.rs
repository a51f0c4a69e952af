//! Threaded pipeline tests: feeds, shared state and the control thread
//! running together against mock drivers.

use approx::assert_relative_eq;
use crossbeam_channel::unbounded;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use yoddha_nav::behavior::MotionCommander;
use yoddha_nav::config::YoddhaConfig;
use yoddha_nav::drivers::GoalState;
use yoddha_nav::drivers::mock::{
    CallLog, DriverCall, MockDetector, MockNavigation, MockTransform, MockVelocity,
};
use yoddha_nav::threads::{FeedReceivers, spawn_threads};
use yoddha_nav::{EnemyObservation, MarkerBearings, Pose2D, RangeScan, SharedState, Twist};

/// Poll `cond` every 10ms until it holds or `timeout` passes.
fn wait_for(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    cond()
}

fn test_config() -> YoddhaConfig {
    let mut config = YoddhaConfig::default();
    config.motion.control_rate_hz = 100.0;
    config.motion.goal_settle_ms = 0;
    config
}

#[test]
fn test_confirmed_enemy_engages_and_shutdown_stops_base() {
    let config = test_config();
    let shared = Arc::new(SharedState::new());
    let log = CallLog::new();
    let nav = MockNavigation::new(log.clone());
    nav.set_state(GoalState::Active);

    let commander = MotionCommander::from_config(
        &config,
        nav,
        MockTransform::new(Pose2D::default()),
        MockVelocity::new(log.clone()),
    )
    .unwrap();

    let (scan_tx, scan_rx) = unbounded();
    let (enemy_tx, enemy_rx) = unbounded();
    let (frame_tx, frame_rx) = unbounded();

    let handles = spawn_threads(
        &config,
        Arc::clone(&shared),
        commander,
        MockDetector,
        FeedReceivers {
            scans: scan_rx,
            enemy: enemy_rx,
            frames: frame_rx,
        },
    )
    .unwrap();

    scan_tx.send(RangeScan::uniform(1.0)).unwrap();
    frame_tx
        .send(MarkerBearings {
            red: Some(0.0),
            ..Default::default()
        })
        .unwrap();

    let backing_off = |log: &CallLog| {
        log.published()
            .iter()
            .any(|cmd| (cmd.linear + 0.2).abs() < 1e-4)
    };

    // Keep the enemy observation fresh until the robot engages
    let engaged = wait_for(Duration::from_secs(3), || {
        let _ = enemy_tx.send(EnemyObservation::new(Instant::now(), 0.3, 0.0));
        backing_off(&log)
    });
    assert!(engaged, "no engage command in {:?}", log.calls());

    let (scans, enemies, frames) = shared.input_counts();
    assert_eq!(scans, 1);
    assert!(enemies >= 1);
    assert_eq!(frames, 1);

    shared.signal_shutdown();
    handles.join();

    let calls = log.calls();
    assert!(matches!(calls.first(), Some(DriverCall::Submit(_))));
    assert_eq!(
        &calls[calls.len() - 2..],
        &[DriverCall::CancelAll, DriverCall::Publish(Twist::ZERO)]
    );
}

#[test]
fn test_feeds_exit_when_sources_disconnect() {
    let config = test_config();
    let shared = Arc::new(SharedState::new());
    let log = CallLog::new();

    let commander = MotionCommander::from_config(
        &config,
        MockNavigation::new(log.clone()),
        MockTransform::new(Pose2D::default()),
        MockVelocity::new(log.clone()),
    )
    .unwrap();

    let (scan_tx, scan_rx) = unbounded::<RangeScan>();
    let (enemy_tx, enemy_rx) = unbounded::<EnemyObservation>();
    let (frame_tx, frame_rx) = unbounded::<MarkerBearings>();

    let handles = spawn_threads(
        &config,
        Arc::clone(&shared),
        commander,
        MockDetector,
        FeedReceivers {
            scans: scan_rx,
            enemy: enemy_rx,
            frames: frame_rx,
        },
    )
    .unwrap();

    drop((scan_tx, enemy_tx, frame_tx));
    assert!(wait_for(Duration::from_secs(2), || handles.any_finished()));

    shared.signal_shutdown();
    handles.join();
}

#[test]
fn test_latest_scan_wins() {
    let config = test_config();
    let shared = Arc::new(SharedState::new());
    let log = CallLog::new();

    let commander = MotionCommander::from_config(
        &config,
        MockNavigation::new(log.clone()),
        MockTransform::new(Pose2D::default()),
        MockVelocity::new(log.clone()),
    )
    .unwrap();

    let (scan_tx, scan_rx) = unbounded();
    let (_enemy_tx, enemy_rx) = unbounded();
    let (_frame_tx, frame_rx) = unbounded();

    // Queue several scans before the feed starts, only the last matters
    for d in [0.5, 0.6, 0.7] {
        scan_tx.send(RangeScan::uniform(d)).unwrap();
    }

    let handles = spawn_threads(
        &config,
        Arc::clone(&shared),
        commander,
        MockDetector,
        FeedReceivers {
            scans: scan_rx,
            enemy: enemy_rx,
            frames: frame_rx,
        },
    )
    .unwrap();

    assert!(wait_for(Duration::from_secs(2), || {
        shared.snapshot().scan.is_some()
    }));
    let scan = shared.snapshot().scan.unwrap();
    assert_relative_eq!(scan.ranges[0], 0.7);

    shared.signal_shutdown();
    handles.join();
}
