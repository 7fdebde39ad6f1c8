//! Prometheus metrics exporter for capture sessions.
//!
//! # Metrics Exposed
//!
//! ## Progress
//! - `iris_capture_frames_total` - Frames pulled from the source
//! - `iris_capture_accepted` - Samples accepted in the current session
//! - `iris_capture_quota` - Samples needed to complete the session
//!
//! ## Detection
//! - `iris_capture_faces_total` - Face boxes reported by the detector
//! - `iris_capture_eye_candidates_total` - Eye boxes reported by the detector
//! - `iris_capture_undersized_total` - Eye boxes below the minimum size
//! - `iris_capture_invalid_regions_total` - Boxes with no area after clipping
//! - `iris_capture_malformed_frames_total` - Frames with a broken buffer
//!
//! ## Gates
//! - `iris_capture_rejections_total{gate="..."}` - Rejections per quality gate
//!
//! # Example
//!
//! ```no_run
//! use iris_capture::metrics::{MetricsRegistry, MetricsSnapshot};
//! use iris_capture::session::CaptureStats;
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//!
//! let stats = CaptureStats {
//!     frames: 42,
//!     accepted: 3,
//!     ..Default::default()
//! };
//! registry.update(&MetricsSnapshot::from_stats(&stats, 10));
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsObserver, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, ServerError};
