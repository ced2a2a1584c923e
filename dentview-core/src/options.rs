//! Viewer configuration, loadable from TOML.
//!
//! Every struct is `#[serde(default)]`, so a file only needs the keys it
//! changes.

use std::f32::consts::FRAC_PI_2;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::animation::PartConfig;
use crate::error::ConfigError;
use crate::projection::ProjectionMode;

/// Orbit controller behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlOptions {
    pub projection: ProjectionMode,
    pub enable_rotate: bool,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Polar angle the orbit is pinned to; `None` keeps the camera's own elevation
    pub polar_angle: Option<f32>,
    pub auto_rotate: bool,
    /// Radians subtracted per auto-rotate call
    pub auto_rotate_speed: f32,
    /// Idle time after input before auto-rotate resumes
    pub quiescence_ms: u64,
}

impl ControlOptions {
    pub fn quiescence(&self) -> Duration {
        Duration::from_millis(self.quiescence_ms)
    }
}

impl Default for ControlOptions {
    fn default() -> Self {
        Self {
            projection: ProjectionMode::Perspective,
            enable_rotate: true,
            enable_zoom: true,
            enable_pan: true,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_zoom: 0.0,
            max_zoom: f32::INFINITY,
            polar_angle: Some(FRAC_PI_2),
            auto_rotate: true,
            auto_rotate_speed: 0.01,
            quiescence_ms: 1000,
        }
    }
}

/// Everything a host needs to set up a viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub controls: ControlOptions,
    pub parts: Vec<PartConfig>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            controls: ControlOptions::default(),
            parts: PartConfig::dental_set(),
        }
    }
}

impl ViewerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{MotionProfile, OpacityProfile};

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = ViewerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.parts.len(), 3);
    }

    #[test]
    fn test_partial_controls() {
        let config = ViewerConfig::from_toml_str(
            r#"
            [controls]
            projection = "orthographic"
            enable_zoom = false
            quiescence_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.controls.projection, ProjectionMode::Orthographic);
        assert!(!config.controls.enable_zoom);
        assert_eq!(config.controls.quiescence(), Duration::from_millis(250));
        assert_eq!(config.controls.rotate_speed, 1.0);
    }

    #[test]
    fn test_parts_table() {
        let config = ViewerConfig::from_toml_str(
            r#"
            [[parts]]
            name = "crown"
            opacity = "sweep"
            motion = "static"

            [parts.start]
            scale = 0.5
            position = [0.0, 1.0, 0.0]
            "#,
        )
        .unwrap();

        assert_eq!(config.parts.len(), 1);
        let part = &config.parts[0];
        assert_eq!(part.name, "crown");
        assert_eq!(part.opacity, OpacityProfile::Sweep);
        assert_eq!(part.motion, MotionProfile::Static);
        assert_eq!(part.start.scale, 0.5);
        assert_eq!(part.start.position, [0.0, 1.0, 0.0]);
        assert_eq!(part.start.rotation, [0.0; 3]);
        assert!(part.visible);
    }

    #[test]
    fn test_hidden_part() {
        let config = ViewerConfig::from_toml_str(
            r#"
            [[parts]]
            name = "appliance"
            visible = false
            "#,
        )
        .unwrap();

        assert!(!config.parts[0].visible);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        assert!(matches!(
            ViewerConfig::from_toml_str("controls = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(matches!(
            ViewerConfig::load("/nonexistent/dentview.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
