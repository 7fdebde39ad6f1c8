//! The capture loop.
//!
//! One frame per step: detect faces, look for the first acceptable eye in
//! each face, store it, and stop once the quota is met or the source runs
//! dry. All recoverable conditions (no detections, undersized or empty
//! boxes, gate rejections) are absorbed here and never reach the caller.

use super::{CancelToken, CaptureSession, CaptureStats};
use crate::capture::{
    crop_gray, CameraError, CaptureConfig, ConfigError, DetectionConfig, FileConfig, Frame,
    FrameSource,
};
use crate::detection::{Region, RegionDetector};
use crate::output::{OutputSink, SinkError};
use crate::quality::{Candidate, GateThresholds};
use chrono::{DateTime, Utc};
use image::GrayImage;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that end a session abnormally.
///
/// Running out of frames is not one of them; see [`SessionOutcome`].
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to open frame source: {0}")]
    Open(#[source] CameraError),
    #[error("failed to store accepted sample: {0}")]
    Sink(#[from] SinkError),
}

/// Why a session stopped before reaching its quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// The frame source failed to deliver a frame.
    SourceExhausted,
    /// Cancellation was requested.
    Cancelled,
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbortReason::SourceExhausted => f.write_str("frame source exhausted"),
            AbortReason::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Lifecycle of a capture controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Created, source not yet opened.
    Idle,
    /// Consuming frames.
    Scanning,
    /// Quota reached. Terminal.
    Complete,
    /// Stopped early. Terminal.
    Aborted(AbortReason),
}

impl ControllerState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ControllerState::Complete | ControllerState::Aborted(_))
    }
}

/// How a finished session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum SessionOutcome {
    Complete,
    Aborted(AbortReason),
}

/// Summary handed back when a session ends.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub outcome: SessionOutcome,
    pub label: String,
    pub session_index: u32,
    pub accepted: u32,
    pub quota: u32,
    pub saved: Vec<PathBuf>,
    pub stats: CaptureStats,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// What happened to one frame.
#[derive(Debug, Clone, Default)]
pub struct StepReport {
    /// Sequence number of the frame.
    pub frame_sequence: u64,
    /// Face boxes the detector reported.
    pub faces: usize,
    /// Samples stored from this frame.
    pub saved: Vec<PathBuf>,
    /// Session totals after the frame.
    pub accepted: u32,
    pub quota: u32,
    pub stats: CaptureStats,
}

/// One-way observer of the capture loop, e.g. a preview window or a
/// metrics exporter. It cannot influence gating or control flow.
pub trait FrameObserver {
    fn observe(&mut self, frame: &Frame, step: &StepReport);
}

/// Drives one capture session from `Idle` to `Complete` or `Aborted`.
pub struct CaptureController<S, D, K> {
    source: S,
    detector: D,
    sink: K,
    capture: CaptureConfig,
    detection: DetectionConfig,
    gates: GateThresholds,
    session: CaptureSession,
    stats: CaptureStats,
    state: ControllerState,
    cancel: CancelToken,
    observer: Option<Box<dyn FrameObserver>>,
    finished_at: Option<DateTime<Utc>>,
}

impl<S, D, K> CaptureController<S, D, K>
where
    S: FrameSource,
    D: RegionDetector,
    K: OutputSink,
{
    /// Creates a controller for a new session.
    pub fn new(source: S, detector: D, sink: K, config: &FileConfig) -> Result<Self, CaptureError> {
        config.validate()?;
        Ok(Self {
            source,
            detector,
            sink,
            capture: config.capture.clone(),
            detection: config.detection.clone(),
            gates: config.gates.clone(),
            session: CaptureSession::new(&config.session),
            stats: CaptureStats::default(),
            state: ControllerState::Idle,
            cancel: CancelToken::new(),
            observer: None,
            finished_at: None,
        })
    }

    /// Stops the session at the next step once `token` is cancelled.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Reports every processed frame to `observer`.
    pub fn with_observer(mut self, observer: Box<dyn FrameObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    pub fn stats(&self) -> &CaptureStats {
        &self.stats
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Gives back the collaborators.
    pub fn into_parts(self) -> (S, D, K) {
        (self.source, self.detector, self.sink)
    }

    /// Opens the source if needed and moves from `Idle` to `Scanning`.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.state != ControllerState::Idle {
            return Ok(());
        }
        if !self.source.is_open() {
            self.source.open(&self.capture).map_err(CaptureError::Open)?;
        }
        self.state = ControllerState::Scanning;
        tracing::info!(
            label = %self.session.label(),
            session = self.session.session_index(),
            quota = self.session.quota(),
            output = %self.session.output_dir().display(),
            "Capture session started"
        );
        Ok(())
    }

    /// Processes one frame. Terminal states are returned unchanged without
    /// touching the source.
    pub fn step(&mut self) -> Result<ControllerState, CaptureError> {
        match self.state {
            ControllerState::Idle => self.start()?,
            ControllerState::Scanning => {}
            terminal => return Ok(terminal),
        }

        if self.cancel.is_cancelled() {
            return Ok(self.finish(ControllerState::Aborted(AbortReason::Cancelled)));
        }

        let frame = match self.source.capture() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    frames = self.stats.frames,
                    accepted = self.session.accepted(),
                    "No frame from source, ending session"
                );
                return Ok(self.finish(ControllerState::Aborted(AbortReason::SourceExhausted)));
            }
        };
        self.stats.frames += 1;

        let step = self.scan_frame(&frame)?;
        if self.session.is_complete() {
            self.finish(ControllerState::Complete);
        }

        if let Some(observer) = self.observer.as_mut() {
            observer.observe(&frame, &step);
        }
        Ok(self.state)
    }

    /// Steps until the session reaches a terminal state.
    pub fn run(&mut self) -> Result<SessionReport, CaptureError> {
        while !self.step()?.is_terminal() {}
        Ok(self.report())
    }

    /// Summary of the session so far. A session that has not reached a
    /// terminal state reports as cancelled.
    pub fn report(&self) -> SessionReport {
        let outcome = match self.state {
            ControllerState::Complete => SessionOutcome::Complete,
            ControllerState::Aborted(reason) => SessionOutcome::Aborted(reason),
            ControllerState::Idle | ControllerState::Scanning => {
                SessionOutcome::Aborted(AbortReason::Cancelled)
            }
        };
        SessionReport {
            outcome,
            label: self.session.label().to_string(),
            session_index: self.session.session_index(),
            accepted: self.session.accepted(),
            quota: self.session.quota(),
            saved: self.session.saved().to_vec(),
            stats: self.stats,
            started_at: self.session.started_at(),
            finished_at: self.finished_at.unwrap_or_else(Utc::now),
        }
    }

    fn finish(&mut self, state: ControllerState) -> ControllerState {
        self.state = state;
        self.finished_at = Some(Utc::now());
        self.source.close();

        match state {
            ControllerState::Complete => tracing::info!(
                accepted = self.session.accepted(),
                frames = self.stats.frames,
                "Capture session complete"
            ),
            ControllerState::Aborted(reason) => tracing::warn!(
                %reason,
                accepted = self.session.accepted(),
                quota = self.session.quota(),
                frames = self.stats.frames,
                "Capture session aborted"
            ),
            _ => {}
        }
        state
    }

    /// Runs detection and gating over one frame.
    ///
    /// At most one sample is stored per face; several faces may each
    /// contribute until the quota is met.
    fn scan_frame(&mut self, frame: &Frame) -> Result<StepReport, CaptureError> {
        let mut step = StepReport {
            frame_sequence: frame.sequence(),
            ..Default::default()
        };

        let Some(gray) = frame.to_gray() else {
            tracing::warn!(frame = ?frame, "Malformed frame buffer, skipping");
            self.stats.malformed_frames += 1;
            return Ok(self.finish_step(step));
        };

        let faces = self
            .detector
            .detect_faces(&gray, &self.detection.face_params());
        step.faces = faces.len();
        self.stats.faces += faces.len() as u64;
        tracing::trace!(frame = frame.sequence(), faces = faces.len(), "Faces detected");

        for face in faces {
            if self.session.is_complete() {
                break;
            }
            let Some(face) = face.clip_to(&frame.bounds()) else {
                tracing::warn!(frame = frame.sequence(), %face, "Face box outside frame, skipping");
                self.stats.invalid_regions += 1;
                continue;
            };
            if let Some(path) = self.scan_face(frame, &gray, &face)? {
                step.saved.push(path);
            }
        }

        Ok(self.finish_step(step))
    }

    /// Stores the first eye of `face` that passes every gate.
    fn scan_face(
        &mut self,
        frame: &Frame,
        gray: &GrayImage,
        face: &Region,
    ) -> Result<Option<PathBuf>, CaptureError> {
        let Some(face_gray) = crop_gray(gray, face) else {
            self.stats.invalid_regions += 1;
            return Ok(None);
        };
        let eye_params = self.detection.eye_params();
        let eyes = self.detector.detect_eyes(&face_gray, &eye_params);
        let face_bounds = Region::new(0, 0, face.width, face.height);

        for eye in eyes {
            self.stats.eye_candidates += 1;

            if !eye.meets_min_size(eye_params.min_size) {
                tracing::trace!(%eye, min = eye_params.min_size, "Eye box below minimum size");
                self.stats.undersized += 1;
                continue;
            }
            let placement = match eye.clip_to(&face_bounds) {
                Some(eye) => eye.offset_by(face),
                None => {
                    tracing::warn!(%eye, %face, "Eye box outside face, skipping");
                    self.stats.invalid_regions += 1;
                    continue;
                }
            };
            let Some(eye_gray) = crop_gray(gray, &placement) else {
                tracing::warn!(eye = %placement, "Empty eye crop, skipping");
                self.stats.invalid_regions += 1;
                continue;
            };

            let candidate = Candidate::new(&eye_gray, placement, frame.width(), frame.height());
            let verdict = self.gates.evaluate(&candidate);
            if let Some(violation) = verdict.violation() {
                tracing::debug!(
                    frame = frame.sequence(),
                    eye = %placement,
                    gate = %violation.gate(),
                    %violation,
                    "Eye candidate rejected"
                );
                self.stats.record_rejection(violation.gate());
                continue;
            }

            return self.accept(&eye_gray).map(Some);
        }
        Ok(None)
    }

    fn accept(&mut self, eye: &GrayImage) -> Result<PathBuf, CaptureError> {
        let name = self.session.next_sample_name();
        let path = self.sink.persist(&name, eye)?;
        self.session.record_accept(path.clone());
        self.stats.accepted += 1;

        tracing::info!(
            capture = name.capture_index,
            quota = self.session.quota(),
            path = %path.display(),
            "Eye sample accepted"
        );
        Ok(path)
    }

    fn finish_step(&self, mut step: StepReport) -> StepReport {
        step.accepted = self.session.accepted();
        step.quota = self.session.quota();
        step.stats = self.stats;
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{SyntheticCamera, SyntheticScene};
    use crate::detection::{FixedLayoutDetector, ScanParams};
    use crate::output::MemorySink;

    fn config(width: u32, height: u32, quota: u32) -> FileConfig {
        let mut config = FileConfig::default();
        config.capture = CaptureConfig::with_dimensions(width, height);
        config.session.label = "300".to_string();
        config.session.quota = quota;
        config
    }

    #[test]
    fn test_centered_scene_completes_quota() {
        let scene = SyntheticScene::centered_eye(320, 240);
        let detector = FixedLayoutDetector::for_scene(&scene);
        let camera = SyntheticCamera::new().with_scene(scene);

        let mut controller =
            CaptureController::new(camera, detector, MemorySink::new(), &config(320, 240, 3))
                .unwrap();
        let report = controller.run().unwrap();

        assert_eq!(report.outcome, SessionOutcome::Complete);
        assert_eq!(report.accepted, 3);
        assert_eq!(report.stats.frames, 3);
        assert_eq!(controller.sink().len(), 3);
        assert_eq!(controller.sink().samples()[2].0, "300_1_3.jpg");
    }

    #[test]
    fn test_blank_scene_aborts_when_source_ends() {
        let scene = SyntheticScene::blank(320, 240);
        let camera = SyntheticCamera::new().with_scene(scene).with_frame_limit(4);

        let mut controller = CaptureController::new(
            camera,
            FixedLayoutDetector::default(),
            MemorySink::new(),
            &config(320, 240, 3),
        )
        .unwrap();
        let report = controller.run().unwrap();

        assert_eq!(
            report.outcome,
            SessionOutcome::Aborted(AbortReason::SourceExhausted)
        );
        assert_eq!(report.accepted, 0);
        assert_eq!(report.stats.frames, 4);
        assert!(controller.sink().is_empty());
    }

    #[test]
    fn test_cancelled_before_first_frame() {
        let token = CancelToken::new();
        token.cancel();
        let mut controller = CaptureController::new(
            SyntheticCamera::new(),
            FixedLayoutDetector::default(),
            MemorySink::new(),
            &config(320, 240, 3),
        )
        .unwrap()
        .with_cancel(token);

        assert_eq!(
            controller.step().unwrap(),
            ControllerState::Aborted(AbortReason::Cancelled)
        );
        assert_eq!(controller.stats().frames, 0);
        // Terminal: further steps do nothing
        assert_eq!(
            controller.step().unwrap(),
            ControllerState::Aborted(AbortReason::Cancelled)
        );
    }

    #[test]
    fn test_undersized_eyes_are_never_gated() {
        let scene = SyntheticScene::centered_eye(320, 240);
        let face = scene.face.unwrap();
        let detector = FixedLayoutDetector::new(vec![face], vec![Region::new(10, 10, 39, 60)]);
        let camera = SyntheticCamera::new().with_scene(scene).with_frame_limit(2);

        let mut controller =
            CaptureController::new(camera, detector, MemorySink::new(), &config(320, 240, 1))
                .unwrap();
        let report = controller.run().unwrap();

        assert_eq!(report.accepted, 0);
        assert_eq!(report.stats.undersized, 2);
        assert_eq!(report.stats.total_rejections(), 0);
    }

    #[test]
    fn test_one_capture_per_face_per_frame() {
        // Two identical eye boxes in one face: only the first is stored.
        let scene = SyntheticScene::centered_eye(320, 240);
        let face = scene.face.unwrap();
        let eye = scene.eye.unwrap();
        let detector = FixedLayoutDetector::new(vec![face], vec![eye, eye]);
        let camera = SyntheticCamera::new().with_scene(scene).with_frame_limit(1);

        let mut controller =
            CaptureController::new(camera, detector, MemorySink::new(), &config(320, 240, 5))
                .unwrap();
        controller.step().unwrap();

        assert_eq!(controller.session().accepted(), 1);
        assert_eq!(controller.stats().eye_candidates, 1);
    }

    #[test]
    fn test_multiple_faces_stop_at_quota() {
        let scene = SyntheticScene::centered_eye(320, 240);
        let face = scene.face.unwrap();
        let eye = scene.eye.unwrap();
        let detector = FixedLayoutDetector::new(vec![face, face, face], vec![eye]);
        let camera = SyntheticCamera::new().with_scene(scene);

        let mut controller =
            CaptureController::new(camera, detector, MemorySink::new(), &config(320, 240, 2))
                .unwrap();

        assert_eq!(controller.step().unwrap(), ControllerState::Complete);
        assert_eq!(controller.session().accepted(), 2);
        assert_eq!(controller.stats().frames, 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut bad = config(320, 240, 1);
        bad.session.quota = 0;
        let result = CaptureController::new(
            SyntheticCamera::new(),
            FixedLayoutDetector::default(),
            MemorySink::new(),
            &bad,
        );
        assert!(matches!(result, Err(CaptureError::Config(ConfigError::InvalidQuota))));
    }

    #[test]
    fn test_face_params_passed_to_detector() {
        struct Recording(Vec<ScanParams>);
        impl RegionDetector for Recording {
            fn detect_faces(&mut self, _: &GrayImage, params: &ScanParams) -> Vec<Region> {
                self.0.push(*params);
                Vec::new()
            }
            fn detect_eyes(&mut self, _: &GrayImage, _: &ScanParams) -> Vec<Region> {
                Vec::new()
            }
        }

        let camera = SyntheticCamera::new().with_frame_limit(1);
        let mut controller = CaptureController::new(
            camera,
            Recording(Vec::new()),
            MemorySink::new(),
            &config(320, 240, 1),
        )
        .unwrap();
        controller.run().unwrap();

        assert_eq!(controller.detector().0.len(), 1);
        assert_eq!(controller.detector().0[0].scale_factor, 1.3);
    }
}
