//! Mutable per-session state.

use crate::capture::SessionConfig;
use crate::output::SampleName;
use crate::quality::Gate;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Progress of one capture session.
///
/// Only the capture controller mutates a session. The capture index only
/// ever grows, so file names are unique within the session.
#[derive(Debug, Clone)]
pub struct CaptureSession {
    label: String,
    session_index: u32,
    output_dir: PathBuf,
    quota: u32,
    accepted: u32,
    capture_index: u64,
    saved: Vec<PathBuf>,
    started_at: DateTime<Utc>,
}

impl CaptureSession {
    /// Starts a fresh session with nothing accepted.
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            label: config.label.clone(),
            session_index: config.session_index,
            output_dir: config.output_dir.clone(),
            quota: config.quota,
            accepted: 0,
            capture_index: 0,
            saved: Vec::new(),
            started_at: Utc::now(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn session_index(&self) -> u32 {
        self.session_index
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn quota(&self) -> u32 {
        self.quota
    }

    /// Samples accepted so far.
    pub fn accepted(&self) -> u32 {
        self.accepted
    }

    /// Index of the most recent capture (0 before the first).
    pub fn capture_index(&self) -> u64 {
        self.capture_index
    }

    /// Samples still needed to reach the quota.
    pub fn remaining(&self) -> u32 {
        self.quota.saturating_sub(self.accepted)
    }

    pub fn is_complete(&self) -> bool {
        self.accepted >= self.quota
    }

    /// Where each accepted sample went, in acceptance order.
    pub fn saved(&self) -> &[PathBuf] {
        &self.saved
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Name the next accepted sample will be stored under.
    pub fn next_sample_name(&self) -> SampleName {
        SampleName {
            label: self.label.clone(),
            session_index: self.session_index,
            capture_index: self.capture_index + 1,
        }
    }

    /// Records a stored sample. Ignored once the quota is met.
    pub(crate) fn record_accept(&mut self, path: PathBuf) {
        if self.is_complete() {
            tracing::warn!(quota = self.quota, "Ignoring capture beyond quota");
            return;
        }
        self.accepted += 1;
        self.capture_index += 1;
        self.saved.push(path);
    }
}

/// Counters describing what the controller saw during a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CaptureStats {
    /// Frames pulled from the source.
    pub frames: u64,
    /// Frames whose buffer did not match their declared layout.
    pub malformed_frames: u64,
    /// Face boxes reported by the detector.
    pub faces: u64,
    /// Eye boxes reported by the detector.
    pub eye_candidates: u64,
    /// Eye boxes below the minimum size.
    pub undersized: u64,
    /// Boxes with no area left after clipping.
    pub invalid_regions: u64,
    /// Candidates rejected by the centering gate.
    pub rejected_centering: u64,
    /// Candidates rejected by the contrast gate.
    pub rejected_contrast: u64,
    /// Candidates rejected by the sharpness gate.
    pub rejected_sharpness: u64,
    /// Candidates rejected by the circularity gate.
    pub rejected_circularity: u64,
    /// Candidates that passed every gate and were stored.
    pub accepted: u64,
}

impl CaptureStats {
    /// Counts a rejection against `gate`.
    pub fn record_rejection(&mut self, gate: Gate) {
        match gate {
            Gate::Centering => self.rejected_centering += 1,
            Gate::Contrast => self.rejected_contrast += 1,
            Gate::Sharpness => self.rejected_sharpness += 1,
            Gate::Circularity => self.rejected_circularity += 1,
        }
    }

    /// Rejections attributed to `gate`.
    pub fn rejections(&self, gate: Gate) -> u64 {
        match gate {
            Gate::Centering => self.rejected_centering,
            Gate::Contrast => self.rejected_contrast,
            Gate::Sharpness => self.rejected_sharpness,
            Gate::Circularity => self.rejected_circularity,
        }
    }

    /// Rejections across all gates.
    pub fn total_rejections(&self) -> u64 {
        Gate::ALL.iter().map(|&gate| self.rejections(gate)).sum()
    }
}
