//! Camera input and frame handling.
//!
//! This module provides abstractions for pulling frames from a video
//! source and managing capture configuration. Sources only deliver pixels;
//! every decision about those pixels is made downstream.

mod camera;
mod config;
mod frame;
#[cfg(feature = "camera")]
mod native;
mod synthetic;

pub use camera::{CameraError, FrameSource, SyntheticCamera};
pub use config::{
    CaptureConfig, ConfigError, DetectionConfig, FileConfig, MetricsConfig, SessionConfig,
};
pub use frame::{crop_gray, Frame, PixelFormat};
#[cfg(feature = "camera")]
pub use native::NativeCamera;
pub use synthetic::SyntheticScene;
