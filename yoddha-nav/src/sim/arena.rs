//! Arena physics and simulated drivers

use parking_lot::Mutex;
use std::f32::consts::TAU;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::drivers::{
    GoalState, NavGoal, NavigationClient, TransformError, TransformProvider, VelocityPublisher,
};
use crate::types::{Pose2D, RAYS_PER_SCAN, RangeScan, Twist};
use crate::utils::normalize_angle;

/// Simulation parameters
#[derive(Clone, Debug)]
pub struct SimConfig {
    /// Half the side length of the square arena (meters)
    pub arena_half_size: f32,
    /// Robot body radius (meters)
    pub robot_radius: f32,
    /// Lidar maximum range, farther rays report no echo (meters)
    pub max_range: f32,
    /// Navigation service cruise speed (m/s)
    pub nav_speed: f32,
    /// Navigation service turn rate (rad/s)
    pub nav_turn_rate: f32,
    /// Distance at which a goal counts as reached (meters)
    pub goal_tolerance: f32,
    /// Direct velocity commands expire after this long
    pub cmd_timeout: Duration,
    /// Opponent orbit radius around the arena centre (meters)
    pub enemy_orbit_radius: f32,
    /// Opponent orbit angular speed (rad/s)
    pub enemy_orbit_speed: f32,
    /// Camera half field of view (radians)
    pub camera_half_fov: f32,
    /// Camera marker recognition range (meters)
    pub camera_max_range: f32,
    /// Robot start pose
    pub start_pose: Pose2D,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            arena_half_size: 1.2,
            robot_radius: 0.1,
            max_range: 3.5,
            nav_speed: 0.2,
            nav_turn_rate: 1.0,
            goal_tolerance: 0.05,
            cmd_timeout: Duration::from_millis(200),
            enemy_orbit_radius: 0.5,
            enemy_orbit_speed: 0.15,
            camera_half_fov: 31f32.to_radians(),
            camera_max_range: 1.5,
            start_pose: Pose2D::new(-1.0, 0.0, 0.0),
        }
    }
}

struct ArenaState {
    robot: Pose2D,
    enemy_angle: f32,
    goal: Option<Pose2D>,
    goal_state: GoalState,
    cmd: Twist,
    cmd_time: Option<Instant>,
}

/// Shared handle to the simulated arena.
#[derive(Clone)]
pub struct SimArena {
    config: Arc<SimConfig>,
    state: Arc<Mutex<ArenaState>>,
}

impl SimArena {
    pub fn new(config: SimConfig) -> Self {
        let state = ArenaState {
            robot: config.start_pose,
            enemy_angle: 0.0,
            goal: None,
            goal_state: GoalState::Lost,
            cmd: Twist::ZERO,
            cmd_time: None,
        };
        Self {
            config: Arc::new(config),
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Advance the simulation by `dt` seconds.
    pub fn step(&self, dt: f32, now: Instant) {
        let c = &self.config;
        let mut s = self.state.lock();

        s.enemy_angle = (s.enemy_angle + c.enemy_orbit_speed * dt).rem_euclid(TAU);

        let direct = s
            .cmd_time
            .is_some_and(|t| now.saturating_duration_since(t) < c.cmd_timeout);

        let (linear, angular) = if direct {
            (s.cmd.linear, s.cmd.angular)
        } else if let (GoalState::Active, Some(goal)) = (s.goal_state, s.goal) {
            let dist = s.robot.distance_to(goal.x, goal.y);
            if dist < c.goal_tolerance {
                s.goal_state = GoalState::Succeeded;
                s.goal = None;
                (0.0, 0.0)
            } else {
                let target = (goal.y - s.robot.y).atan2(goal.x - s.robot.x);
                let error = normalize_angle(target - s.robot.theta);
                let angular = (2.0 * error).clamp(-c.nav_turn_rate, c.nav_turn_rate);
                let linear = if error.abs() < 0.3 {
                    c.nav_speed.min(dist / dt.max(1e-3))
                } else {
                    0.0
                };
                (linear, angular)
            }
        } else {
            (0.0, 0.0)
        };

        let limit = c.arena_half_size - c.robot_radius;
        let theta = normalize_angle(s.robot.theta + angular * dt);
        s.robot = Pose2D::new(
            (s.robot.x + linear * theta.cos() * dt).clamp(-limit, limit),
            (s.robot.y + linear * theta.sin() * dt).clamp(-limit, limit),
            theta,
        );
    }

    /// Current robot pose in the arena frame.
    pub fn robot_pose(&self) -> Pose2D {
        self.state.lock().robot
    }

    /// Current opponent position.
    pub fn enemy_position(&self) -> (f32, f32) {
        let angle = self.state.lock().enemy_angle;
        let r = self.config.enemy_orbit_radius;
        (r * angle.cos(), r * angle.sin())
    }

    /// Synthetic lidar scan against the arena walls and the opponent body.
    pub fn scan(&self) -> RangeScan {
        let robot = self.robot_pose();
        let enemy = self.enemy_position();
        let c = &self.config;

        let ranges = (0..RAYS_PER_SCAN)
            .map(|deg| {
                let angle = robot.theta + (deg as f32).to_radians();
                let (dx, dy) = (angle.cos(), angle.sin());
                let wall = ray_to_box(robot.x, robot.y, dx, dy, c.arena_half_size);
                let body = ray_to_circle(robot.x, robot.y, dx, dy, enemy, c.robot_radius);
                let d = body.map_or(wall, |b| b.min(wall));
                if d > c.max_range { 0.0 } else { d }
            })
            .collect();

        RangeScan::new(ranges)
    }

    /// Bearing to the opponent if the camera can see it.
    pub fn visible_enemy_bearing(&self) -> Option<f32> {
        let robot = self.robot_pose();
        let (ex, ey) = self.enemy_position();
        let bearing = normalize_angle((ey - robot.y).atan2(ex - robot.x) - robot.theta);
        let visible = bearing.abs() <= self.config.camera_half_fov
            && robot.distance_to(ex, ey) <= self.config.camera_max_range;
        visible.then_some(bearing)
    }

    pub fn navigation(&self) -> SimNavigation {
        SimNavigation {
            arena: self.clone(),
        }
    }

    pub fn transform(&self) -> SimTransform {
        SimTransform {
            arena: self.clone(),
        }
    }

    pub fn velocity(&self) -> SimVelocity {
        SimVelocity {
            arena: self.clone(),
        }
    }
}

/// Distance along a unit ray from inside an axis-aligned square to its edge.
fn ray_to_box(x: f32, y: f32, dx: f32, dy: f32, half: f32) -> f32 {
    let tx = if dx > 0.0 {
        (half - x) / dx
    } else if dx < 0.0 {
        (-half - x) / dx
    } else {
        f32::INFINITY
    };
    let ty = if dy > 0.0 {
        (half - y) / dy
    } else if dy < 0.0 {
        (-half - y) / dy
    } else {
        f32::INFINITY
    };
    tx.min(ty).max(0.0)
}

/// Distance along a unit ray to the first hit on a circle, if any.
fn ray_to_circle(x: f32, y: f32, dx: f32, dy: f32, center: (f32, f32), radius: f32) -> Option<f32> {
    let (ox, oy) = (x - center.0, y - center.1);
    let b = ox * dx + oy * dy;
    let c = ox * ox + oy * oy - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    (t > 0.0).then_some(t)
}

/// Navigation service that drives straight to the goal.
#[derive(Clone)]
pub struct SimNavigation {
    arena: SimArena,
}

impl NavigationClient for SimNavigation {
    fn submit(&mut self, goal: &NavGoal) {
        let mut s = self.arena.state.lock();
        s.goal = Some(goal.pose);
        s.goal_state = GoalState::Active;
    }

    fn cancel_all(&mut self) {
        let mut s = self.arena.state.lock();
        s.goal = None;
        if s.goal_state == GoalState::Active {
            s.goal_state = GoalState::Preempted;
        }
    }

    fn state(&self) -> GoalState {
        self.arena.state.lock().goal_state
    }

    fn status_text(&self) -> Option<String> {
        let s = self.arena.state.lock();
        let text = match (s.goal_state, s.goal) {
            (GoalState::Active, Some(goal)) => format!(
                "driving to ({:.2}, {:.2}), {:.2}m left",
                goal.x,
                goal.y,
                s.robot.distance_to(goal.x, goal.y)
            ),
            (GoalState::Succeeded, _) => "goal reached".to_string(),
            (GoalState::Preempted, _) => "goal cancelled".to_string(),
            _ => return None,
        };
        Some(text)
    }
}

/// Transform tree with exactly one link: map -> base_link.
#[derive(Clone)]
pub struct SimTransform {
    arena: SimArena,
}

impl TransformProvider for SimTransform {
    fn lookup(
        &self,
        target_frame: &str,
        source_frame: &str,
        _at: Option<Instant>,
    ) -> Result<Pose2D, TransformError> {
        if !(target_frame.ends_with("map") && source_frame.ends_with("base_link")) {
            return Err(TransformError::Lookup(format!(
                "no transform from {} to {}",
                source_frame, target_frame
            )));
        }
        Ok(self.arena.robot_pose())
    }
}

/// Direct velocity input, overriding navigation until it expires.
#[derive(Clone)]
pub struct SimVelocity {
    arena: SimArena,
}

impl VelocityPublisher for SimVelocity {
    fn publish(&mut self, cmd: Twist) {
        let mut s = self.arena.state.lock();
        s.cmd = cmd;
        s.cmd_time = Some(Instant::now());
    }
}
