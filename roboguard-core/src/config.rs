//! Session parameters
//!
//! The whole configuration surface of the perception and navigation core.
//! Defaults match the values the robot was tuned with; a file (JSON, TOML or
//! YAML) or `ROBOGUARD_*` environment variables may override them.

use crate::error::{Error, Result};
use crate::types::Rgb;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Colour detection and distance estimation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionParameters {
    /// Colour the clustering step looks for
    pub target_color: Rgb,
    /// Colour of the border drawn around a detection
    pub border_color: Rgb,
    /// Fraction of working pixels the target cluster must exceed
    pub color_threshold: f64,
    /// Largest RGB distance between a cluster centre and the target colour
    /// for that cluster to count as the target
    pub match_radius: f64,
    /// Distance reported for a target that fills the frame
    pub min_distance: f64,
    /// Distance reported for a barely visible target
    pub max_distance: f64,
    /// Pixel count at which interpolation starts
    pub area_min: u32,
    /// Pixel count at which interpolation ends
    pub area_max: u32,
    /// Number of colour clusters per frame
    pub cluster_count: usize,
    /// Working resolution (width, height) frames are downscaled to
    pub working_resolution: (u32, u32),
    /// Upper bound on clustering iterations
    pub max_iterations: usize,
    /// Centre movement (RGB units) below which clustering has converged
    pub convergence_tolerance: f64,
    /// Seed for cluster initialisation
    pub seed: u64,
    /// Pause between polls of an empty frame queue, in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for VisionParameters {
    fn default() -> Self {
        Self {
            target_color: [255, 255, 255],
            border_color: [0, 255, 0],
            color_threshold: 0.07,
            match_radius: 100.0,
            min_distance: 10.0,
            max_distance: 100.0,
            area_min: 100,
            area_max: 4000,
            cluster_count: 6,
            working_resolution: (80, 60),
            max_iterations: 50,
            convergence_tolerance: 0.5,
            seed: 42,
            poll_interval_ms: 5,
        }
    }
}

impl VisionParameters {
    /// Pixel count of the working resolution
    pub fn working_pixels(&self) -> usize {
        self.working_resolution.0 as usize * self.working_resolution.1 as usize
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Obstacle avoidance parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationParameters {
    /// Range (mm) below which an obstacle is too close
    pub safe_distance: f64,
    /// Magnitude of every avoidance or circling turn, in degrees
    pub turn_degrees: f64,
    /// Wait after a turn command, in milliseconds
    pub turn_settle_ms: u64,
    /// Wait after a forward command, in milliseconds
    pub forward_settle_ms: u64,
    /// Forward run before circling a detected object, in milliseconds
    pub circle_forward_ms: u64,
    /// Wait after the circling turn, in milliseconds
    pub circle_turn_settle_ms: u64,
    /// Wait before re-reading sensors after an unusable reading, in milliseconds
    pub sensor_retry_ms: u64,
}

impl Default for NavigationParameters {
    fn default() -> Self {
        Self {
            safe_distance: 200.0,
            turn_degrees: 90.0,
            turn_settle_ms: 1000,
            forward_settle_ms: 500,
            circle_forward_ms: 1000,
            circle_turn_settle_ms: 1000,
            sensor_retry_ms: 50,
        }
    }
}

impl NavigationParameters {
    pub fn turn_settle(&self) -> Duration {
        Duration::from_millis(self.turn_settle_ms)
    }

    pub fn forward_settle(&self) -> Duration {
        Duration::from_millis(self.forward_settle_ms)
    }

    pub fn circle_forward(&self) -> Duration {
        Duration::from_millis(self.circle_forward_ms)
    }

    pub fn circle_turn_settle(&self) -> Duration {
        Duration::from_millis(self.circle_turn_settle_ms)
    }

    pub fn sensor_retry(&self) -> Duration {
        Duration::from_millis(self.sensor_retry_ms)
    }
}

/// Session-wide parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionParameters {
    /// Wall-clock session length in seconds
    pub run_duration_secs: u64,
    /// Frame queue capacity
    pub queue_capacity: usize,
    /// Camera resolution (width, height)
    pub frame_resolution: (u32, u32),
    /// Target capture rate (frames per second)
    pub frame_rate: u32,
    /// Consecutive capture failures tolerated before capture gives up
    pub max_capture_failures: u32,
}

impl Default for SessionParameters {
    fn default() -> Self {
        Self {
            run_duration_secs: 30,
            queue_capacity: 10,
            frame_resolution: (320, 240),
            frame_rate: 30,
            max_capture_failures: 10,
        }
    }
}

impl SessionParameters {
    pub fn run_duration(&self) -> Duration {
        Duration::from_secs(self.run_duration_secs)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate.max(1) as f64)
    }
}

/// Complete parameter set for one session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    pub vision: VisionParameters,
    pub navigation: NavigationParameters,
    pub session: SessionParameters,
}

impl Parameters {
    /// Load parameters from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    /// Parse parameters from JSON, TOML or YAML text
    pub fn from_str(content: &str) -> Result<Self> {
        if let Ok(params) = serde_json::from_str::<Parameters>(content) {
            return Ok(params);
        }

        if let Ok(params) = toml::from_str::<Parameters>(content) {
            return Ok(params);
        }

        if let Ok(params) = serde_yaml::from_str::<Parameters>(content) {
            return Ok(params);
        }

        Err(Error::Parse("Unknown format".to_string()))
    }

    /// Apply `ROBOGUARD_*` environment overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(secs) = std::env::var("ROBOGUARD_RUN_DURATION_SECS") {
            if let Ok(v) = secs.parse::<u64>() {
                self.session.run_duration_secs = v;
            }
        }

        if let Ok(mm) = std::env::var("ROBOGUARD_SAFE_DISTANCE_MM") {
            if let Ok(v) = mm.parse::<f64>() {
                self.navigation.safe_distance = v;
            }
        }

        if let Ok(threshold) = std::env::var("ROBOGUARD_COLOR_THRESHOLD") {
            if let Ok(v) = threshold.parse::<f64>() {
                self.vision.color_threshold = v;
            }
        }

        if let Ok(capacity) = std::env::var("ROBOGUARD_QUEUE_CAPACITY") {
            if let Ok(v) = capacity.parse::<usize>() {
                self.session.queue_capacity = v;
            }
        }

        self
    }

    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        let vision = &self.vision;
        if !(vision.color_threshold > 0.0 && vision.color_threshold < 1.0) {
            return Err(config_error("color_threshold must be between 0.0 and 1.0"));
        }
        if !(vision.match_radius > 0.0) {
            return Err(config_error("match_radius must be positive"));
        }
        if !(vision.min_distance < vision.max_distance) {
            return Err(config_error("min_distance must be below max_distance"));
        }
        if vision.area_min >= vision.area_max {
            return Err(config_error("area_min must be below area_max"));
        }
        if vision.cluster_count == 0 {
            return Err(config_error("cluster_count must be greater than 0"));
        }
        if vision.working_resolution.0 == 0 || vision.working_resolution.1 == 0 {
            return Err(config_error("working_resolution must be non-zero"));
        }
        if vision.max_iterations == 0 {
            return Err(config_error("max_iterations must be greater than 0"));
        }

        let nav = &self.navigation;
        if !(nav.safe_distance > 0.0) {
            return Err(config_error("safe_distance must be positive"));
        }

        let session = &self.session;
        if session.run_duration_secs == 0 {
            return Err(config_error("run_duration_secs must be greater than 0"));
        }
        if session.queue_capacity == 0 {
            return Err(config_error("queue_capacity must be greater than 0"));
        }
        if session.frame_resolution.0 == 0 || session.frame_resolution.1 == 0 {
            return Err(config_error("frame_resolution must be non-zero"));
        }
        if session.frame_rate == 0 || session.frame_rate > 120 {
            return Err(config_error("frame_rate must be between 1 and 120"));
        }

        Ok(())
    }
}

fn config_error(msg: &str) -> Error {
    Error::Configuration(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = Parameters::default();
        assert_eq!(params.vision.target_color, [255, 255, 255]);
        assert_eq!(params.vision.color_threshold, 0.07);
        assert_eq!(params.vision.cluster_count, 6);
        assert_eq!(params.vision.working_pixels(), 4800);
        assert_eq!(params.session.queue_capacity, 10);
        assert_eq!(params.session.run_duration(), Duration::from_secs(30));
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_inverted_bounds() {
        let mut params = Parameters::default();
        params.vision.area_min = 4000;
        params.vision.area_max = 100;
        assert!(params.validate().is_err());

        let mut params = Parameters::default();
        params.vision.min_distance = 100.0;
        params.vision.max_distance = 10.0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_validation_edge_cases() {
        let mut params = Parameters::default();
        params.vision.color_threshold = 1.0;
        assert!(params.validate().is_err());

        let mut params = Parameters::default();
        params.session.queue_capacity = 0;
        assert!(params.validate().is_err());

        let mut params = Parameters::default();
        params.session.frame_rate = 121;
        assert!(params.validate().is_err());

        let mut params = Parameters::default();
        params.navigation.safe_distance = f64::NAN;
        assert!(params.validate().is_err());

        let mut params = Parameters::default();
        params.session.frame_rate = 120;
        params.vision.working_resolution = (1, 1);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let content = r#"
            [navigation]
            safe_distance = 150.0

            [session]
            run_duration_secs = 5
        "#;
        let params = Parameters::from_str(content).unwrap();
        assert_eq!(params.navigation.safe_distance, 150.0);
        assert_eq!(params.session.run_duration_secs, 5);
        assert_eq!(params.session.queue_capacity, 10);
        assert_eq!(params.vision.area_max, 4000);
    }

    #[test]
    fn test_json_and_yaml() {
        let json = r#"{"vision": {"color_threshold": 0.2}}"#;
        assert_eq!(Parameters::from_str(json).unwrap().vision.color_threshold, 0.2);

        let yaml = "session:\n  queue_capacity: 4\n";
        assert_eq!(Parameters::from_str(yaml).unwrap().session.queue_capacity, 4);
    }

    #[test]
    fn test_env_overrides() {
        // All ROBOGUARD_* mutation lives in this one test
        let vars = [
            "ROBOGUARD_RUN_DURATION_SECS",
            "ROBOGUARD_SAFE_DISTANCE_MM",
            "ROBOGUARD_COLOR_THRESHOLD",
            "ROBOGUARD_QUEUE_CAPACITY",
        ];

        for (var, value) in vars.iter().zip(["12", "350.5", "0.15", "4"]) {
            std::env::set_var(var, value);
        }
        let params = Parameters::default().with_env_overrides();
        assert_eq!(params.session.run_duration_secs, 12);
        assert_eq!(params.navigation.safe_distance, 350.5);
        assert_eq!(params.vision.color_threshold, 0.15);
        assert_eq!(params.session.queue_capacity, 4);

        for (var, value) in vars.iter().zip(["-3", "near", "", "four"]) {
            std::env::set_var(var, value);
        }
        let params = Parameters::default().with_env_overrides();
        assert_eq!(params, Parameters::default());

        for var in vars {
            std::env::remove_var(var);
        }
        assert_eq!(Parameters::default().with_env_overrides(), Parameters::default());
    }

    #[test]
    fn test_unknown_format() {
        assert!(matches!(
            Parameters::from_str("[[[ not a config"),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Parameters::from_file("/nonexistent/roboguard.toml"),
            Err(Error::Io(_))
        ));
    }
}
