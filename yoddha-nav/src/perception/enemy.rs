//! Enemy detection fusing the position feed with camera confirmation.
//!
//! The enemy position feed gives range and bearing but also fires on walls
//! and arena props. Inside the band where the camera can see (near and ahead)
//! a position-feed detection only counts when the camera also sees a marker.
//! Outside that band the position feed is trusted on its own.

use std::time::{Duration, Instant};

use crate::config::YoddhaConfig;
use crate::drivers::TransformProvider;
use crate::types::{CameraSignal, EnemyObservation};
use crate::utils::normalize_angle;

/// Per-tick enemy detection result.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Detection {
    pub present: bool,
    /// Distance to the enemy in meters (0 when absent)
    pub distance: f32,
    /// Bearing relative to the robot heading, radians in (-π, π] (0 when absent)
    pub bearing: f32,
}

impl Detection {
    pub const ABSENT: Detection = Detection {
        present: false,
        distance: 0.0,
        bearing: 0.0,
    };

    pub fn found(distance: f32, bearing: f32) -> Self {
        Self {
            present: true,
            distance,
            bearing,
        }
    }
}

/// Detection thresholds.
#[derive(Clone, Debug)]
pub struct FusionConfig {
    /// Observations older than this are ignored
    pub enemy_time_tolerance: Duration,
    /// Consecutive fresh ticks required before trusting a detection
    pub counter_th: u32,
    /// Half-angle of the camera confirmation cone (radians)
    pub camera_angle_limit: f32,
    /// Distance band [min, max] of the camera confirmation window (meters)
    pub camera_range_limit: [f32; 2],
    /// Frame the enemy position is reported in
    pub map_frame: String,
    /// Robot body frame
    pub base_frame: String,
}

impl FusionConfig {
    pub fn from_config(config: &YoddhaConfig) -> Self {
        Self {
            enemy_time_tolerance: config.detection.enemy_time_tolerance(),
            counter_th: config.detection.counter_th,
            camera_angle_limit: config.detection.camera_angle_rad(),
            camera_range_limit: config.detection.camera_range_limit,
            map_frame: config.map_frame(),
            base_frame: config.base_frame(),
        }
    }
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self::from_config(&YoddhaConfig::default())
    }
}

/// Debounced, camera-corroborated enemy detector.
pub struct EnemyDetector {
    config: FusionConfig,
    /// Consecutive ticks with a fresh observation
    counter: u32,
}

impl EnemyDetector {
    pub fn new(config: FusionConfig) -> Self {
        Self { config, counter: 0 }
    }

    /// Current debounce count.
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Produce this tick's detection.
    ///
    /// Never fails: a stale feed, a missing transform or a camera mismatch
    /// all yield [`Detection::ABSENT`].
    pub fn detect<T: TransformProvider + ?Sized>(
        &mut self,
        now: Instant,
        enemy: Option<&EnemyObservation>,
        camera: Option<&CameraSignal>,
        tf: &T,
    ) -> Detection {
        let detection = self.detect_from_feed(now, enemy, tf);

        if detection.present && self.in_camera_window(&detection) {
            let confirmed = camera.is_some_and(CameraSignal::is_present);
            if !confirmed {
                tracing::info!(
                    "Enemy at {:.2}m {:.1}° not confirmed by camera, ignoring",
                    detection.distance,
                    detection.bearing.to_degrees()
                );
                return Detection::ABSENT;
            }
        }

        detection
    }

    /// Debounced detection from the enemy position feed alone.
    fn detect_from_feed<T: TransformProvider + ?Sized>(
        &mut self,
        now: Instant,
        enemy: Option<&EnemyObservation>,
        tf: &T,
    ) -> Detection {
        let Some(enemy) = enemy else {
            self.counter = 0;
            return Detection::ABSENT;
        };

        let age = now.saturating_duration_since(enemy.stamp);
        if age > self.config.enemy_time_tolerance {
            if self.counter > 0 {
                tracing::debug!("Enemy observation stale ({:.2}s), resetting", age.as_secs_f32());
            }
            self.counter = 0;
            return Detection::ABSENT;
        }

        self.counter = self.counter.saturating_add(1);
        if self.counter < self.config.counter_th {
            return Detection::ABSENT;
        }

        let own = match tf.lookup(&self.config.map_frame, &self.config.base_frame, None) {
            Ok(pose) => pose,
            Err(e) => {
                tracing::warn!("Own pose unavailable: {}", e);
                return Detection::ABSENT;
            }
        };

        let dx = enemy.x - own.x;
        let dy = enemy.y - own.y;
        let distance = dx.hypot(dy);
        let bearing = normalize_angle(dy.atan2(dx) - own.theta);

        Detection::found(distance, bearing)
    }

    /// Whether the camera is expected to see an enemy at this position.
    fn in_camera_window(&self, detection: &Detection) -> bool {
        let [min, max] = self.config.camera_range_limit;
        detection.bearing.abs() <= self.config.camera_angle_limit
            && (min..=max).contains(&detection.distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::TransformError;
    use crate::drivers::mock::MockTransform;
    use crate::types::Pose2D;
    use approx::assert_relative_eq;

    fn detector() -> EnemyDetector {
        EnemyDetector::new(FusionConfig::default())
    }

    /// Enemy observation at `distance` and world angle `angle_deg` from the origin.
    fn enemy_at(now: Instant, distance: f32, angle_deg: f32) -> EnemyObservation {
        let a = angle_deg.to_radians();
        EnemyObservation::new(now, distance * a.cos(), distance * a.sin())
    }

    /// Run `ticks` detections with a fresh observation each tick.
    fn run_fresh(
        det: &mut EnemyDetector,
        tf: &MockTransform,
        obs: EnemyObservation,
        camera: Option<&CameraSignal>,
        ticks: usize,
    ) -> Vec<Detection> {
        (0..ticks)
            .map(|_| {
                let now = obs.stamp;
                det.detect(now, Some(&obs), camera, tf)
            })
            .collect()
    }

    #[test]
    fn test_no_observation_is_absent() {
        let tf = MockTransform::new(Pose2D::default());
        let mut det = detector();
        assert_eq!(det.detect(Instant::now(), None, None, &tf), Detection::ABSENT);
        assert_eq!(det.counter(), 0);
    }

    #[test]
    fn test_debounce_requires_counter_th_ticks() {
        let tf = MockTransform::new(Pose2D::default());
        let mut det = detector();
        let obs = enemy_at(Instant::now(), 1.0, 0.0);

        let results = run_fresh(&mut det, &tf, obs, None, 3);
        assert!(!results[0].present);
        assert!(!results[1].present);
        assert!(results[2].present);
        assert_eq!(det.counter(), 3);
    }

    #[test]
    fn test_stale_observation_resets_counter() {
        let tf = MockTransform::new(Pose2D::default());
        let mut det = detector();
        let start = Instant::now();
        let obs = enemy_at(start, 1.0, 0.0);

        run_fresh(&mut det, &tf, obs, None, 2);
        assert_eq!(det.counter(), 2);

        let later = start + Duration::from_millis(600);
        let result = det.detect(later, Some(&obs), None, &tf);
        assert_eq!(result, Detection::ABSENT);
        assert_eq!(det.counter(), 0);

        // Debounce starts over after staleness
        let fresh = enemy_at(later, 1.0, 0.0);
        let results = run_fresh(&mut det, &tf, fresh, None, 3);
        assert!(!results[0].present && !results[1].present);
        assert!(results[2].present);
    }

    #[test]
    fn test_age_at_tolerance_is_fresh() {
        let tf = MockTransform::new(Pose2D::default());
        let mut det = detector();
        let start = Instant::now();
        let obs = enemy_at(start, 1.0, 0.0);
        let now = start + Duration::from_millis(500);

        det.detect(now, Some(&obs), None, &tf);
        assert_eq!(det.counter(), 1);
    }

    #[test]
    fn test_transform_failure_is_absent() {
        let tf = MockTransform::new(Pose2D::default());
        tf.set_error(TransformError::Extrapolation("future".into()));
        let mut det = detector();
        let obs = enemy_at(Instant::now(), 1.0, 0.0);

        let results = run_fresh(&mut det, &tf, obs, None, 5);
        assert!(results.iter().all(|d| !d.present));
        // Debounce keeps counting, only the geometry failed
        assert_eq!(det.counter(), 5);
    }

    #[test]
    fn test_lookup_uses_namespaced_frames() {
        let tf = MockTransform::new(Pose2D::default());
        let mut config = YoddhaConfig::default();
        config.robot.namespace = "blue_bot".into();
        let mut det = EnemyDetector::new(FusionConfig::from_config(&config));
        let obs = enemy_at(Instant::now(), 1.0, 0.0);

        run_fresh(&mut det, &tf, obs, None, 3);
        assert_eq!(
            tf.last_lookup(),
            Some(("blue_bot/map".to_string(), "blue_bot/base_link".to_string()))
        );
    }

    #[test]
    fn test_distance_and_bearing_relative_to_own_pose() {
        // Robot at (1, 1) facing +Y, enemy at (0, 1): straight to the left
        let tf = MockTransform::new(Pose2D::new(1.0, 1.0, std::f32::consts::FRAC_PI_2));
        let mut det = detector();
        let obs = EnemyObservation::new(Instant::now(), 0.0, 1.0);

        let d = *run_fresh(&mut det, &tf, obs, None, 3).last().unwrap();
        assert!(d.present);
        assert_relative_eq!(d.distance, 1.0, epsilon = 1e-5);
        assert_relative_eq!(d.bearing, std::f32::consts::FRAC_PI_2, epsilon = 1e-5);
    }

    #[test]
    fn test_bearing_wraps_behind_robot() {
        // Robot facing -170°, enemy at world 170°: 20° to the right
        let tf = MockTransform::new(Pose2D::new(0.0, 0.0, (-170f32).to_radians()));
        let mut det = detector();
        let obs = enemy_at(Instant::now(), 2.0, 170.0);

        let d = *run_fresh(&mut det, &tf, obs, None, 3).last().unwrap();
        assert_relative_eq!(d.bearing, (-20f32).to_radians(), epsilon = 1e-4);
    }

    #[test]
    fn test_camera_window_requires_confirmation() {
        let tf = MockTransform::new(Pose2D::default());
        let obs = enemy_at(Instant::now(), 0.3, 10.0);

        let mut det = detector();
        let unconfirmed = run_fresh(&mut det, &tf, obs, Some(&CameraSignal::ABSENT), 4);
        assert!(unconfirmed.iter().all(|d| !d.present));

        let mut det = detector();
        let no_frame_yet = run_fresh(&mut det, &tf, obs, None, 4);
        assert!(no_frame_yet.iter().all(|d| !d.present));

        let mut det = detector();
        let seen = CameraSignal::seen(0.17);
        let confirmed = run_fresh(&mut det, &tf, obs, Some(&seen), 3);
        assert!(confirmed[2].present);
        assert_relative_eq!(confirmed[2].distance, 0.3, epsilon = 1e-5);
    }

    #[test]
    fn test_camera_window_bounds_are_inclusive() {
        let det = detector();
        let limit = 30f32.to_radians();

        assert!(det.in_camera_window(&Detection::found(0.2, 0.0)));
        assert!(det.in_camera_window(&Detection::found(0.5, 0.0)));
        assert!(det.in_camera_window(&Detection::found(0.3, limit)));
        assert!(det.in_camera_window(&Detection::found(0.3, -limit)));

        assert!(!det.in_camera_window(&Detection::found(0.19, 0.0)));
        assert!(!det.in_camera_window(&Detection::found(0.51, 0.0)));
        assert!(!det.in_camera_window(&Detection::found(0.3, 31f32.to_radians())));

        // On the far edge the camera still has to confirm
        let tf = MockTransform::new(Pose2D::default());
        let obs = enemy_at(Instant::now(), 0.5, 0.0);
        let mut det = detector();
        let edge = run_fresh(&mut det, &tf, obs, Some(&CameraSignal::ABSENT), 3);
        assert!(!edge[2].present);
    }

    #[test]
    fn test_outside_camera_window_ignores_camera() {
        let tf = MockTransform::new(Pose2D::default());

        // Within range band, outside the angle cone
        let wide = enemy_at(Instant::now(), 0.3, 60.0);
        let mut det = detector();
        let d = run_fresh(&mut det, &tf, wide, Some(&CameraSignal::ABSENT), 3)[2];
        assert!(d.present);
        assert_relative_eq!(d.bearing, 60f32.to_radians(), epsilon = 1e-5);

        // Inside the cone, farther than the camera band
        let far = enemy_at(Instant::now(), 0.7, 0.0);
        let mut det = detector();
        assert!(run_fresh(&mut det, &tf, far, Some(&CameraSignal::ABSENT), 3)[2].present);

        // Inside the cone, closer than the camera band
        let near = enemy_at(Instant::now(), 0.1, 0.0);
        let mut det = detector();
        assert!(run_fresh(&mut det, &tf, near, Some(&CameraSignal::ABSENT), 3)[2].present);
    }
}
