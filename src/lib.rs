//! Iris Capture Library
//!
//! Quality-gated capture of eye-region images from live video, for building
//! iris datasets. Frames are scanned for faces, each face for eyes, and an
//! eye crop is stored only when it passes every quality gate.
//!
//! # Architecture
//!
//! The system follows an explicit data flow:
//!
//! ```text
//! capture → detection → quality → output
//!     ↓          ↓          ↓        ↓
//!              session (controller, stats, cancellation)
//! ```
//!
//! # Design Principles
//!
//! - **Pure gates**: quality checks are deterministic functions of pixels,
//!   placement and thresholds, separate from the I/O loop
//! - **Pluggable seams**: frame source, region detector and output sink are
//!   traits, so the loop runs the same against hardware or synthetic scenes
//! - **Explicit outcome**: a session ends `Complete` or `Aborted` with a
//!   reason, never silently
//!
//! # Example
//!
//! ```no_run
//! use iris_capture::{
//!     capture::{FileConfig, SyntheticCamera, SyntheticScene},
//!     detection::FixedLayoutDetector,
//!     output::DiskSink,
//!     session::{CaptureController, SessionOutcome},
//! };
//!
//! let mut config = FileConfig::default();
//! config.session.label = "300".to_string();
//!
//! let scene = SyntheticScene::centered_eye(config.capture.width, config.capture.height);
//! let detector = FixedLayoutDetector::for_scene(&scene);
//! let camera = SyntheticCamera::new().with_scene(scene);
//! let sink = DiskSink::new(&config.session.output_dir);
//!
//! let mut controller = CaptureController::new(camera, detector, sink, &config).unwrap();
//! let report = controller.run().unwrap();
//!
//! assert_eq!(report.outcome, SessionOutcome::Complete);
//! println!("stored {} samples", report.saved.len());
//! ```

#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod detection;
pub mod metrics;
pub mod output;
pub mod quality;
pub mod session;

// Re-export commonly used types at crate root
pub use capture::{CaptureConfig, FileConfig, Frame, FrameSource, SyntheticCamera};
pub use detection::{FixedLayoutDetector, Region, RegionDetector};
pub use output::{DiskSink, OutputSink};
pub use quality::{GateThresholds, QualityVerdict};
pub use session::{CaptureController, CaptureError, SessionOutcome, SessionReport};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
