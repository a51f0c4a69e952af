//! YoddhaNav - arena combat navigation
//!
//! Runs the patrol/engage control loop against the built-in arena simulator.

use clap::Parser;
use crossbeam_channel::bounded;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use yoddha_nav::behavior::MotionCommander;
use yoddha_nav::config::{YoddhaConfig, seconds_to_duration};
use yoddha_nav::error::Result;
use yoddha_nav::shared::SharedState;
use yoddha_nav::sim::{SimArena, SimConfig, SimMarkerDetector, SimSenders, spawn_sim_sensors};
use yoddha_nav::threads::{FeedReceivers, spawn_threads};

/// Sensor publish rate of the simulated robot
const SIM_RATE_HZ: f32 = 20.0;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (defaults to ./yoddha.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Robot namespace, prefixed to frame ids
    #[arg(short, long)]
    namespace: Option<String>,

    /// Control loop rate override (Hz)
    #[arg(long)]
    rate: Option<f32>,

    /// Stop after this many seconds (runs until Ctrl+C otherwise)
    #[arg(long)]
    duration: Option<f32>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("yoddha_nav=info")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let run_for = args
        .duration
        .map(|secs| seconds_to_duration("--duration", secs))
        .transpose()?;

    info!("YoddhaNav v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Frames: {} -> {}, control at {:.0}Hz",
        config.map_frame(),
        config.base_frame(),
        config.motion.control_rate_hz
    );
    info!(
        "Engage below {:.2}m, attack cone ±{:.0}°, wall threshold {:.2}m",
        config.detection.snipe_th,
        config.motion.attack_angle_deg,
        config.motion.distance_to_wall_th
    );

    let shared_state = Arc::new(SharedState::new());
    setup_signal_handler(Arc::clone(&shared_state))?;

    // Simulated robot
    let arena = SimArena::new(SimConfig::default());
    let (scan_tx, scan_rx) = bounded(4);
    let (enemy_tx, enemy_rx) = bounded(4);
    let (frame_tx, frame_rx) = bounded(4);
    let sim = spawn_sim_sensors(
        arena.clone(),
        Arc::clone(&shared_state),
        SimSenders {
            scans: scan_tx,
            enemy: enemy_tx,
            frames: frame_tx,
        },
        SIM_RATE_HZ,
    )?;

    let commander = MotionCommander::from_config(
        &config,
        arena.navigation(),
        arena.transform(),
        arena.velocity(),
    )?;
    info!("Patrol route: {} waypoints", commander.waypoints().len());

    let handles = spawn_threads(
        &config,
        Arc::clone(&shared_state),
        commander,
        SimMarkerDetector,
        FeedReceivers {
            scans: scan_rx,
            enemy: enemy_rx,
            frames: frame_rx,
        },
    )?;

    info!("Press Ctrl+C to stop");

    // Main thread: monitor until shutdown, timeout or a worker dies
    let check_interval = Duration::from_millis(500);
    let deadline = run_for.and_then(|run| Instant::now().checked_add(run));

    loop {
        std::thread::sleep(check_interval);

        if shared_state.should_shutdown() {
            info!("Shutdown requested");
            break;
        }

        if deadline.is_some_and(|d| Instant::now() >= d) {
            info!("Run duration elapsed");
            break;
        }

        if handles.any_finished() || sim.is_finished() {
            warn!("A worker thread exited unexpectedly");
            break;
        }
    }

    shared_state.signal_shutdown();
    info!("Waiting for threads to finish...");
    handles.join();
    if let Err(e) = sim.join() {
        tracing::error!("Sim thread panicked: {:?}", e);
    }

    info!("YoddhaNav finished");
    Ok(())
}

/// Resolve configuration from the command line, file and defaults.
fn load_config(args: &Args) -> Result<YoddhaConfig> {
    let default_path = Path::new("yoddha.toml");

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            YoddhaConfig::load(path)?
        }
        None if default_path.exists() => {
            info!("Loading configuration from yoddha.toml");
            YoddhaConfig::load(default_path)?
        }
        None => {
            info!("Using default configuration");
            YoddhaConfig::default()
        }
    };

    if let Some(namespace) = &args.namespace {
        info!("Using namespace: {}", namespace);
        config.robot.namespace = namespace.clone();
    }
    if let Some(rate) = args.rate {
        config.motion.control_rate_hz = rate;
    }

    config.validate()?;
    Ok(config)
}

/// Set the shutdown flag on SIGINT/SIGTERM.
fn setup_signal_handler(shared_state: Arc<SharedState>) -> Result<()> {
    let mut signals = Signals::new([SIGINT, SIGTERM])?;

    std::thread::Builder::new()
        .name("signal-handler".to_string())
        .spawn(move || {
            if let Some(sig) = signals.forever().next() {
                info!("Received signal {}, initiating shutdown...", sig);
                shared_state.signal_shutdown();
            }
        })?;

    Ok(())
}
