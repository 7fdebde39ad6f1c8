//! Capture session control.
//!
//! Owns the per-session state and the loop that turns frames into stored
//! eye samples.

mod cancel;
mod controller;
mod state;

pub use cancel::CancelToken;
pub use controller::{
    AbortReason, CaptureController, CaptureError, ControllerState, FrameObserver, SessionOutcome,
    SessionReport, StepReport,
};
pub use state::{CaptureSession, CaptureStats};
