//! Configuration loading for YoddhaNav

use crate::behavior::{Waypoint, WaypointCycle};
use crate::error::{Result, YoddhaError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct YoddhaConfig {
    #[serde(default)]
    pub robot: RobotConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub waypoints: WaypointConfig,
}

/// Robot identity
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RobotConfig {
    /// Frame namespace prefix, e.g. "red_bot" gives "red_bot/map" (default: none)
    #[serde(default)]
    pub namespace: String,
}

/// Enemy detection and camera corroboration
#[derive(Clone, Debug, Deserialize)]
pub struct DetectionConfig {
    /// Maximum age of an enemy observation in seconds (default: 0.5)
    #[serde(default = "default_enemy_time_tolerance")]
    pub enemy_time_tolerance: f32,

    /// Consecutive fresh ticks before a detection is trusted (default: 3)
    #[serde(default = "default_counter_th")]
    pub counter_th: u32,

    /// Engage when the enemy is closer than this, meters (default: 0.8)
    #[serde(default = "default_snipe_th")]
    pub snipe_th: f32,

    /// Distance band [min, max] in which the camera can confirm, meters (default: [0.2, 0.5])
    #[serde(default = "default_camera_range_limit")]
    pub camera_range_limit: [f32; 2],

    /// Half-angle of the camera confirmation cone, degrees (default: 30)
    #[serde(default = "default_camera_angle_deg")]
    pub camera_angle_deg: f32,
}

/// Motion command parameters
#[derive(Clone, Debug, Deserialize)]
pub struct MotionConfig {
    /// Wall proximity that triggers recovery, meters (default: 0.15)
    #[serde(default = "default_distance_to_wall_th")]
    pub distance_to_wall_th: f32,

    /// Desired separation from the enemy while engaging, meters (default: 0.5)
    #[serde(default = "default_approach_standoff")]
    pub approach_standoff: f32,

    /// Half-angle of the cone in which the robot drives at the enemy, degrees (default: 45)
    #[serde(default = "default_attack_angle_deg")]
    pub attack_angle_deg: f32,

    /// Speed of the move-away maneuver after a wall hit, m/s (default: 0.1)
    #[serde(default = "default_recovery_speed")]
    pub recovery_speed: f32,

    /// Control loop rate in Hz (default: 30)
    #[serde(default = "default_control_rate_hz")]
    pub control_rate_hz: f32,

    /// Goal state polls are ignored this long after a submission, ms (default: 500)
    #[serde(default = "default_goal_settle_ms")]
    pub goal_settle_ms: u64,

    /// Resubmit the current waypoint when navigation aborts (default: true)
    #[serde(default = "default_resubmit_on_abort")]
    pub resubmit_on_abort: bool,
}

/// Patrol route source
#[derive(Clone, Debug, Deserialize)]
pub struct WaypointConfig {
    /// Inline route, used when no CSV file is given
    #[serde(default = "default_points")]
    pub points: Vec<Waypoint>,

    /// CSV file with `x,y,heading` rows; relative paths resolve against the config file
    #[serde(default)]
    pub csv_path: Option<PathBuf>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            enemy_time_tolerance: default_enemy_time_tolerance(),
            counter_th: default_counter_th(),
            snipe_th: default_snipe_th(),
            camera_range_limit: default_camera_range_limit(),
            camera_angle_deg: default_camera_angle_deg(),
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            distance_to_wall_th: default_distance_to_wall_th(),
            approach_standoff: default_approach_standoff(),
            attack_angle_deg: default_attack_angle_deg(),
            recovery_speed: default_recovery_speed(),
            control_rate_hz: default_control_rate_hz(),
            goal_settle_ms: default_goal_settle_ms(),
            resubmit_on_abort: default_resubmit_on_abort(),
        }
    }
}

impl Default for WaypointConfig {
    fn default() -> Self {
        Self {
            points: default_points(),
            csv_path: None,
        }
    }
}

// Default value functions
fn default_enemy_time_tolerance() -> f32 {
    0.5
}
fn default_counter_th() -> u32 {
    3
}
fn default_snipe_th() -> f32 {
    0.8
}
fn default_camera_range_limit() -> [f32; 2] {
    [0.2, 0.5]
}
fn default_camera_angle_deg() -> f32 {
    30.0
}
fn default_distance_to_wall_th() -> f32 {
    0.15
}
fn default_approach_standoff() -> f32 {
    0.5
}
fn default_attack_angle_deg() -> f32 {
    45.0
}
fn default_recovery_speed() -> f32 {
    0.1
}
fn default_control_rate_hz() -> f32 {
    30.0
}
fn default_goal_settle_ms() -> u64 {
    500
}
fn default_resubmit_on_abort() -> bool {
    true
}

// Loop around the arena centre, heading along the route
fn default_points() -> Vec<Waypoint> {
    use std::f32::consts::{FRAC_PI_2, PI};
    vec![
        Waypoint::new(-0.9, 0.0, FRAC_PI_2),
        Waypoint::new(0.0, 0.9, 0.0),
        Waypoint::new(0.9, 0.0, -FRAC_PI_2),
        Waypoint::new(0.0, -0.9, PI),
    ]
}

impl YoddhaConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| YoddhaError::Config(format!("Failed to read config file: {}", e)))?;
        let mut config: YoddhaConfig = toml::from_str(&content)?;

        if let Some(csv) = config.waypoints.csv_path.as_mut()
            && csv.is_relative()
            && let Some(dir) = path.parent()
        {
            *csv = dir.join(&*csv);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the control loop cannot work with.
    pub fn validate(&self) -> Result<()> {
        let d = &self.detection;
        let m = &self.motion;

        if !(d.enemy_time_tolerance.is_finite() && d.enemy_time_tolerance > 0.0) {
            return Err(YoddhaError::Config(format!(
                "enemy_time_tolerance must be positive, got {}",
                d.enemy_time_tolerance
            )));
        }
        if d.counter_th == 0 {
            return Err(YoddhaError::Config("counter_th must be at least 1".into()));
        }
        let [min, max] = d.camera_range_limit;
        if !(0.0..=max).contains(&min) {
            return Err(YoddhaError::Config(format!(
                "camera_range_limit must satisfy 0 <= min <= max, got [{}, {}]",
                min, max
            )));
        }
        if !(m.control_rate_hz.is_finite() && m.control_rate_hz > 0.0) {
            return Err(YoddhaError::Config(format!(
                "control_rate_hz must be positive, got {}",
                m.control_rate_hz
            )));
        }
        seconds_to_duration("enemy_time_tolerance", d.enemy_time_tolerance)?;
        seconds_to_duration("control period", 1.0 / m.control_rate_hz)?;
        for (name, value) in [
            ("snipe_th", d.snipe_th),
            ("camera_angle_deg", d.camera_angle_deg),
            ("distance_to_wall_th", m.distance_to_wall_th),
            ("approach_standoff", m.approach_standoff),
            ("attack_angle_deg", m.attack_angle_deg),
            ("recovery_speed", m.recovery_speed),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(YoddhaError::Config(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Map frame id, e.g. "red_bot/map"
    pub fn map_frame(&self) -> String {
        self.robot.frame("map")
    }

    /// Robot body frame id, e.g. "red_bot/base_link"
    pub fn base_frame(&self) -> String {
        self.robot.frame("base_link")
    }

    /// Build the patrol route from the configured source.
    pub fn waypoint_cycle(&self) -> Result<WaypointCycle> {
        match &self.waypoints.csv_path {
            Some(path) => WaypointCycle::from_csv(path),
            None => WaypointCycle::new(self.waypoints.points.clone()),
        }
    }
}

/// Checked seconds-to-`Duration` conversion for config values.
pub fn seconds_to_duration(name: &str, secs: f32) -> Result<Duration> {
    Duration::try_from_secs_f32(secs)
        .map_err(|e| YoddhaError::Config(format!("{} of {}s is out of range: {}", name, secs, e)))
}

impl RobotConfig {
    fn frame(&self, name: &str) -> String {
        let ns = self.namespace.trim_matches('/');
        if ns.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", ns, name)
        }
    }
}

impl DetectionConfig {
    /// Saturates on values [`YoddhaConfig::validate`] rejects.
    pub fn enemy_time_tolerance(&self) -> Duration {
        Duration::try_from_secs_f32(self.enemy_time_tolerance).unwrap_or(Duration::MAX)
    }

    pub fn camera_angle_rad(&self) -> f32 {
        self.camera_angle_deg.to_radians()
    }
}

impl MotionConfig {
    pub fn attack_angle_rad(&self) -> f32 {
        self.attack_angle_deg.to_radians()
    }

    /// Saturates on values [`YoddhaConfig::validate`] rejects.
    pub fn control_period(&self) -> Duration {
        Duration::try_from_secs_f32(1.0 / self.control_rate_hz).unwrap_or(Duration::MAX)
    }

    pub fn goal_settle(&self) -> Duration {
        Duration::from_millis(self.goal_settle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = YoddhaConfig::default();
        assert_relative_eq!(config.detection.enemy_time_tolerance, 0.5);
        assert_eq!(config.detection.counter_th, 3);
        assert_relative_eq!(config.detection.snipe_th, 0.8);
        assert_eq!(config.detection.camera_range_limit, [0.2, 0.5]);
        assert_relative_eq!(config.detection.camera_angle_rad(), 30f32.to_radians());
        assert_relative_eq!(config.motion.distance_to_wall_th, 0.15);
        assert_relative_eq!(config.motion.approach_standoff, 0.5);
        assert_relative_eq!(config.motion.attack_angle_rad(), 45f32.to_radians());
        assert_eq!(config.waypoints.points.len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: YoddhaConfig = toml::from_str(
            r#"
            [robot]
            namespace = "red_bot"

            [detection]
            snipe_th = 1.2
            "#,
        )
        .unwrap();

        assert_relative_eq!(config.detection.snipe_th, 1.2);
        assert_eq!(config.detection.counter_th, 3);
        assert_relative_eq!(config.motion.control_rate_hz, 30.0);
        assert_eq!(config.map_frame(), "red_bot/map");
        assert_eq!(config.base_frame(), "red_bot/base_link");
    }

    #[test]
    fn test_frames_without_namespace() {
        let config = YoddhaConfig::default();
        assert_eq!(config.map_frame(), "map");
        assert_eq!(config.base_frame(), "base_link");
    }

    #[test]
    fn test_validate_rejects_inverted_camera_band() {
        let mut config = YoddhaConfig::default();
        config.detection.camera_range_limit = [0.6, 0.2];
        assert!(matches!(config.validate(), Err(YoddhaError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_rate_and_counter() {
        let mut config = YoddhaConfig::default();
        config.motion.control_rate_hz = 0.0;
        assert!(config.validate().is_err());

        let mut config = YoddhaConfig::default();
        config.detection.counter_th = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unrepresentable_durations() {
        let mut config = YoddhaConfig::default();
        config.detection.enemy_time_tolerance = 1e20;
        assert!(matches!(config.validate(), Err(YoddhaError::Config(_))));
        assert_eq!(config.detection.enemy_time_tolerance(), Duration::MAX);

        let mut config = YoddhaConfig::default();
        config.motion.control_rate_hz = 1e-30;
        assert!(matches!(config.validate(), Err(YoddhaError::Config(_))));
        assert_eq!(config.motion.control_period(), Duration::MAX);
    }

    #[test]
    fn test_seconds_to_duration() {
        assert_eq!(
            seconds_to_duration("run", 1.5).unwrap(),
            Duration::from_millis(1500)
        );
        assert!(seconds_to_duration("run", -1.0).is_err());
        assert!(seconds_to_duration("run", f32::NAN).is_err());
    }

    #[test]
    fn test_load_resolves_relative_csv() {
        let dir = TempDir::new().unwrap();
        let csv_path = dir.path().join("route.csv");
        std::fs::write(&csv_path, "x,y,heading\n0.5,0.0,0.0\n0.0,0.5,1.57\n").unwrap();

        let config_path = dir.path().join("yoddha.toml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "[waypoints]\ncsv_path = \"route.csv\"").unwrap();

        let config = YoddhaConfig::load(&config_path).unwrap();
        assert_eq!(config.waypoints.csv_path.as_deref(), Some(csv_path.as_path()));

        let cycle = config.waypoint_cycle().unwrap();
        assert_eq!(cycle.len(), 2);
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("bad.toml");
        std::fs::write(&config_path, "[motion\nrecovery_speed = ").unwrap();

        assert!(matches!(
            YoddhaConfig::load(&config_path),
            Err(YoddhaError::Config(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = YoddhaConfig::load(Path::new("/nonexistent/yoddha.toml"));
        assert!(matches!(result, Err(YoddhaError::Config(_))));
    }
}
