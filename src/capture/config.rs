//! Capture and session configuration.
//!
//! Everything a session needs is supplied from outside: camera settings,
//! detector parameters, gate thresholds and naming. Nothing in the core
//! hard-codes a path or a subject label.

use crate::detection::Region;
use crate::quality::GateThresholds;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for camera capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Camera device index or identifier.
    pub device_id: u32,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Target frames per second.
    pub fps: u32,
    /// Request grayscale frames from the source when it supports it.
    pub grayscale: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_id: 0,
            width: 640,
            height: 480,
            fps: 30,
            grayscale: false,
        }
    }
}

impl CaptureConfig {
    /// Creates a new configuration with the specified dimensions.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.fps == 0 || self.fps > 120 {
            return Err(ConfigError::InvalidFrameRate);
        }
        Ok(())
    }
}

/// Region detector parameters.
///
/// These are passed through to the detector untouched; the only value the
/// capture controller acts on itself is `min_eye_size`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Image pyramid scale step for face detection.
    pub face_scale_factor: f64,
    /// Minimum overlapping hits for a face to be reported.
    pub face_min_neighbors: u32,
    /// Image pyramid scale step for eye detection.
    pub eye_scale_factor: f64,
    /// Minimum overlapping hits for an eye to be reported.
    pub eye_min_neighbors: u32,
    /// Smallest eye box (width and height) considered for gating.
    pub min_eye_size: u32,
    /// Fixed face box for guide-box detection, in frame coordinates.
    pub guide_face: Option<Region>,
    /// Fixed eye box for guide-box detection, relative to `guide_face`.
    pub guide_eye: Option<Region>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            face_scale_factor: 1.3,
            face_min_neighbors: 5,
            eye_scale_factor: 1.1,
            eye_min_neighbors: 5,
            min_eye_size: 40,
            guide_face: None,
            guide_eye: None,
        }
    }
}

impl DetectionConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.face_scale_factor > 1.0) || !(self.eye_scale_factor > 1.0) {
            return Err(ConfigError::InvalidScaleFactor);
        }
        if self.min_eye_size == 0 {
            return Err(ConfigError::InvalidMinEyeSize);
        }
        Ok(())
    }
}

/// Per-session naming and quota.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Directory accepted samples are written to.
    pub output_dir: PathBuf,
    /// Subject label, first component of every file name.
    pub label: String,
    /// Session number, second component of every file name.
    pub session_index: u32,
    /// Number of accepted samples that completes the session.
    pub quota: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("captures"),
            label: "subject".to_string(),
            session_index: 1,
            quota: 10,
        }
    }
}

impl SessionConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quota == 0 {
            return Err(ConfigError::InvalidQuota);
        }
        if self.label.is_empty()
            || self
                .label
                .chars()
                .any(|c| matches!(c, '/' | '\\' | ':') || c.is_control())
        {
            return Err(ConfigError::InvalidLabel(self.label.clone()));
        }
        Ok(())
    }
}

/// Metrics exporter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Metrics server port (0 to disable).
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { port: 0 }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid frame dimensions")]
    InvalidDimensions,
    #[error("invalid frame rate (must be 1-120 fps)")]
    InvalidFrameRate,
    #[error("detector scale factors must be greater than 1.0")]
    InvalidScaleFactor,
    #[error("minimum eye size must be at least 1 pixel")]
    InvalidMinEyeSize,
    #[error("quota must be at least 1")]
    InvalidQuota,
    #[error("invalid subject label {0:?}")]
    InvalidLabel(String),
    #[error("invalid gate threshold: {0}")]
    InvalidThreshold(String),
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub gates: GateThresholds,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.capture.validate()?;
        self.detection.validate()?;
        self.gates.validate()?;
        self.session.validate()
    }
}
