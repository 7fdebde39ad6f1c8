//! Frame source abstraction.
//!
//! This module provides a trait-based abstraction over camera hardware,
//! allowing for both real camera input and synthetic implementations for
//! testing and demos.

use super::{synthetic::SyntheticScene, CaptureConfig, Frame};
use thiserror::Error;

/// Errors that can occur during camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("camera device not found: {0}")]
    DeviceNotFound(String),
    #[error("failed to open camera: {0}")]
    OpenFailed(String),
    #[error("failed to configure camera: {0}")]
    ConfigFailed(String),
    #[error("failed to capture frame: {0}")]
    CaptureFailed(String),
    #[error("frame source exhausted after {0} frames")]
    Exhausted(u64),
    #[error("camera not initialized")]
    NotInitialized,
}

/// Trait for frame sources.
///
/// A failed [`FrameSource::capture`] ends the capture session; the
/// controller never retries.
pub trait FrameSource {
    /// Opens and initializes the source with the given configuration.
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError>;

    /// Captures a single frame.
    fn capture(&mut self) -> Result<Frame, CameraError>;

    /// Checks if the source is currently open.
    fn is_open(&self) -> bool;

    /// Closes the source and releases resources.
    fn close(&mut self);
}

/// Synthetic camera that renders an eye-like scene on every frame.
///
/// With a frame limit set, capture fails once the limit is reached, which
/// is how tests model a source that dies mid-session.
#[derive(Debug, Default)]
pub struct SyntheticCamera {
    config: Option<CaptureConfig>,
    scene: Option<SyntheticScene>,
    frame_limit: Option<u64>,
    sequence: u64,
}

impl SyntheticCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders `scene` instead of the default centred eye.
    pub fn with_scene(mut self, scene: SyntheticScene) -> Self {
        self.scene = Some(scene);
        self
    }

    /// Stops producing frames after `limit` captures.
    pub fn with_frame_limit(mut self, limit: u64) -> Self {
        self.frame_limit = Some(limit);
        self
    }

    /// Number of frames handed out so far.
    pub fn frames_captured(&self) -> u64 {
        self.sequence
    }
}

impl FrameSource for SyntheticCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;
        if self.scene.is_none() {
            self.scene = Some(SyntheticScene::centered_eye(config.width, config.height));
        }
        self.config = Some(config.clone());
        self.sequence = 0;
        tracing::info!("SyntheticCamera opened with config: {:?}", config);
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame, CameraError> {
        let config = self.config.as_ref().ok_or(CameraError::NotInitialized)?;
        let scene = self.scene.as_ref().ok_or(CameraError::NotInitialized)?;

        if let Some(limit) = self.frame_limit {
            if self.sequence >= limit {
                return Err(CameraError::Exhausted(self.sequence));
            }
        }

        self.sequence += 1;
        let frame = if config.grayscale {
            Frame::from_gray(scene.render_gray(), self.sequence)
        } else {
            Frame::from_rgb(scene.render_rgb(), self.sequence)
        };
        Ok(frame)
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }

    fn close(&mut self) {
        self.config = None;
        tracing::info!("SyntheticCamera closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_camera_lifecycle() {
        let mut camera = SyntheticCamera::new();
        let config = CaptureConfig::with_dimensions(160, 120);

        assert!(!camera.is_open());

        camera.open(&config).unwrap();
        assert!(camera.is_open());

        let frame = camera.capture().unwrap();
        assert!(frame.is_valid());
        assert_eq!(frame.sequence(), 1);
        assert_eq!((frame.width(), frame.height()), (160, 120));

        let frame2 = camera.capture().unwrap();
        assert_eq!(frame2.sequence(), 2);

        camera.close();
        assert!(!camera.is_open());
    }

    #[test]
    fn test_capture_without_open() {
        let mut camera = SyntheticCamera::new();
        assert!(matches!(
            camera.capture(),
            Err(CameraError::NotInitialized)
        ));
    }

    #[test]
    fn test_frame_limit_exhausts_source() {
        let mut camera = SyntheticCamera::new().with_frame_limit(2);
        camera.open(&CaptureConfig::with_dimensions(64, 48)).unwrap();

        assert!(camera.capture().is_ok());
        assert!(camera.capture().is_ok());
        assert!(matches!(camera.capture(), Err(CameraError::Exhausted(2))));
        assert_eq!(camera.frames_captured(), 2);
    }
}
