//! Motion command generation.
//!
//! Runs once per control tick: fuses the inputs into a detection, picks the
//! mode and then either manages the patrol goal through the navigation
//! service or drives at the enemy directly. A wall on either end always takes
//! priority over both.

use std::time::{Duration, Instant};

use super::mode::{Mode, decide_mode};
use super::waypoints::{Waypoint, WaypointCycle};
use crate::config::YoddhaConfig;
use crate::drivers::{GoalState, NavGoal, NavigationClient, TransformProvider, VelocityPublisher};
use crate::error::Result;
use crate::perception::{CollisionGuard, CollisionStatus, EnemyDetector, FusionConfig};
use crate::shared::InputSnapshot;
use crate::types::{RangeScan, Twist};

/// Configuration for motion command generation.
#[derive(Clone, Debug)]
pub struct CommanderConfig {
    /// Engage enemies closer than this (meters)
    pub snipe_th: f32,
    /// Drive at the enemy only when it is within this bearing (radians)
    pub attack_angle_th: f32,
    /// Desired separation while engaging (meters)
    pub approach_standoff: f32,
    /// Wall proximity that triggers recovery (meters)
    pub distance_to_wall_th: f32,
    /// Recovery move-away speed (m/s)
    pub recovery_speed: f32,
    /// Goal state polls are skipped this long after a submission
    pub goal_settle: Duration,
    /// Resubmit the current waypoint when the navigation service aborts
    pub resubmit_on_abort: bool,
    /// Frame the patrol goals are expressed in
    pub map_frame: String,
}

impl CommanderConfig {
    pub fn from_config(config: &YoddhaConfig) -> Self {
        Self {
            snipe_th: config.detection.snipe_th,
            attack_angle_th: config.motion.attack_angle_rad(),
            approach_standoff: config.motion.approach_standoff,
            distance_to_wall_th: config.motion.distance_to_wall_th,
            recovery_speed: config.motion.recovery_speed,
            goal_settle: config.motion.goal_settle(),
            resubmit_on_abort: config.motion.resubmit_on_abort,
            map_frame: config.map_frame(),
        }
    }
}

impl Default for CommanderConfig {
    fn default() -> Self {
        Self::from_config(&YoddhaConfig::default())
    }
}

/// Per-tick mode decision and actuation.
///
/// Owns the debounce counter (inside the detector), the waypoint cursor and
/// the previous mode. Only the control thread touches it.
pub struct MotionCommander<N, T, V> {
    config: CommanderConfig,
    guard: CollisionGuard,
    detector: EnemyDetector,
    waypoints: WaypointCycle,
    nav: N,
    tf: T,
    vel: V,
    /// Mode chosen on the previous tick
    mode: Mode,
    /// Last goal state seen, for change logging
    goal_state: Option<GoalState>,
    /// Goal state polls resume after this instant
    settle_until: Option<Instant>,
}

impl<N, T, V> MotionCommander<N, T, V>
where
    N: NavigationClient,
    T: TransformProvider,
    V: VelocityPublisher,
{
    pub fn new(
        config: CommanderConfig,
        fusion: FusionConfig,
        waypoints: WaypointCycle,
        nav: N,
        tf: T,
        vel: V,
    ) -> Self {
        Self {
            guard: CollisionGuard::new(config.distance_to_wall_th),
            detector: EnemyDetector::new(fusion),
            config,
            waypoints,
            nav,
            tf,
            vel,
            mode: Mode::Patrol,
            goal_state: None,
            settle_until: None,
        }
    }

    /// Build from the loaded configuration, including the patrol route.
    pub fn from_config(config: &YoddhaConfig, nav: N, tf: T, vel: V) -> Result<Self> {
        Ok(Self::new(
            CommanderConfig::from_config(config),
            FusionConfig::from_config(config),
            config.waypoint_cycle()?,
            nav,
            tf,
            vel,
        ))
    }

    /// Mode chosen on the most recent tick.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn waypoints(&self) -> &WaypointCycle {
        &self.waypoints
    }

    pub fn detector(&self) -> &EnemyDetector {
        &self.detector
    }

    /// Send the first patrol goal.
    pub fn start(&mut self, now: Instant) {
        tracing::info!("Starting patrol over {} waypoints", self.waypoints.len());
        self.send_goal(now, self.waypoints.current());
    }

    /// Run one decision-and-command cycle.
    pub fn tick(&mut self, now: Instant, inputs: &InputSnapshot) -> Mode {
        let mode = self.decide(now, inputs);
        self.command(now, mode, inputs);
        mode
    }

    /// Fuse this tick's inputs into a mode. Advances the detection debounce.
    pub fn decide(&mut self, now: Instant, inputs: &InputSnapshot) -> Mode {
        let detection = self.detector.detect(
            now,
            inputs.enemy.as_ref(),
            inputs.camera.as_ref(),
            &self.tf,
        );
        decide_mode(&detection, self.config.snipe_th)
    }

    /// Carry out `mode` for this tick. Retreat and Guard issue no commands.
    pub fn command(&mut self, now: Instant, mode: Mode, inputs: &InputSnapshot) {
        if !mode.same_kind(&self.mode) {
            tracing::info!("Mode change: {} -> {}", self.mode, mode);
        }
        self.mode = mode;

        let scan = inputs.scan.as_deref();
        match mode {
            Mode::Patrol => self.patrol(now, scan),
            Mode::Engage { distance, bearing } => self.engage(distance, bearing, scan),
            Mode::Retreat | Mode::Guard => {}
        }
    }

    /// Cancel goals and stop the base.
    pub fn stop(&mut self) {
        self.nav.cancel_all();
        self.vel.publish(Twist::ZERO);
    }

    fn patrol(&mut self, now: Instant, scan: Option<&RangeScan>) {
        let collision = self.guard.check(scan);
        if self.recover(collision) {
            return;
        }

        if let Some(until) = self.settle_until {
            if now < until {
                return;
            }
            self.settle_until = None;
        }

        let state = self.nav.state();
        if self.goal_state != Some(state) {
            match self.nav.status_text() {
                Some(text) => tracing::info!("Goal state {}: {}", state, text),
                None => tracing::info!("Goal state {}", state),
            }
            self.goal_state = Some(state);
        }

        match state {
            GoalState::Active => {}
            GoalState::Succeeded => {
                let next = self.waypoints.advance();
                self.send_goal(now, next);
            }
            GoalState::Aborted => {
                // The recovery check above already ran on this tick's scan
                if self.config.resubmit_on_abort {
                    tracing::warn!(
                        "Goal aborted without a wall nearby, resubmitting waypoint {}",
                        self.waypoints.index()
                    );
                    self.send_goal(now, self.waypoints.current());
                }
            }
            GoalState::Pending | GoalState::Preempting | GoalState::Preempted => {
                self.send_goal(now, self.waypoints.current());
            }
            GoalState::Rejected | GoalState::Recalling | GoalState::Recalled | GoalState::Lost => {}
        }
    }

    fn engage(&mut self, distance: f32, bearing: f32, scan: Option<&RangeScan>) {
        self.nav.cancel_all();
        self.settle_until = None;

        let collision = self.guard.check(scan);
        let linear = if collision.any() {
            0.0
        } else if bearing.abs() < self.config.attack_angle_th {
            distance - self.config.approach_standoff
        } else {
            // Face the enemy before closing in
            0.0
        };

        let cmd = Twist::new(linear, bearing);
        tracing::debug!(
            "Engage: dist={:.2}m, bearing={:.1}°, cmd=({:.3}, {:.3})",
            distance,
            bearing.to_degrees(),
            cmd.linear,
            cmd.angular
        );
        self.vel.publish(cmd);
    }

    /// Cancel navigation and back away from a wall. Returns false when clear.
    fn recover(&mut self, collision: CollisionStatus) -> bool {
        match collision.recovery_velocity(self.config.recovery_speed) {
            Some(cmd) => {
                self.nav.cancel_all();
                self.vel.publish(cmd);
                true
            }
            None => false,
        }
    }

    fn send_goal(&mut self, now: Instant, waypoint: Waypoint) {
        let goal = NavGoal {
            frame_id: self.config.map_frame.clone(),
            pose: waypoint.to_pose(),
            stamp: now,
        };
        self.nav.submit(&goal);
        self.settle_until = Some(now + self.config.goal_settle);

        tracing::info!(
            "Sent goal {}/{}: ({:.2}, {:.2}, {:.1}°)",
            self.waypoints.index() + 1,
            self.waypoints.len(),
            waypoint.x,
            waypoint.y,
            waypoint.heading.to_degrees()
        );
    }
}
