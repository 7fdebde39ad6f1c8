//! Metrics collection and registry.

use crate::capture::Frame;
use crate::quality::Gate;
use crate::session::{CaptureStats, FrameObserver, StepReport};
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of session state for metrics update.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    /// Session counters.
    pub stats: CaptureStats,
    /// Samples accepted so far.
    pub accepted: u32,
    /// Samples needed to complete the session.
    pub quota: u32,
}

impl MetricsSnapshot {
    /// Creates a snapshot from session counters.
    pub fn from_stats(stats: &CaptureStats, quota: u32) -> Self {
        Self {
            stats: *stats,
            accepted: stats.accepted.min(u64::from(u32::MAX)) as u32,
            quota,
        }
    }

    /// Creates a snapshot from a per-frame step report.
    pub fn from_step(step: &StepReport) -> Self {
        Self {
            stats: step.stats,
            accepted: step.accepted,
            quota: step.quota,
        }
    }
}

/// Prometheus metrics registry for capture monitoring.
///
/// Cloning shares the underlying metrics, so one clone can be served over
/// HTTP while another is updated by the capture loop.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,

    // Progress
    frames_total: IntCounter,
    accepted: IntGauge,
    quota: IntGauge,

    // Detection
    faces_total: IntCounter,
    eye_candidates_total: IntCounter,
    undersized_total: IntCounter,
    invalid_regions_total: IntCounter,
    malformed_frames_total: IntCounter,

    // Gates
    rejections_total: IntCounterVec,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all capture metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let frames_total = IntCounter::new(
            "iris_capture_frames_total",
            "Frames pulled from the frame source",
        )?;
        let accepted = IntGauge::new(
            "iris_capture_accepted",
            "Samples accepted in the current session",
        )?;
        let quota = IntGauge::new(
            "iris_capture_quota",
            "Samples needed to complete the session",
        )?;

        let faces_total = IntCounter::new(
            "iris_capture_faces_total",
            "Face boxes reported by the detector",
        )?;
        let eye_candidates_total = IntCounter::new(
            "iris_capture_eye_candidates_total",
            "Eye boxes reported by the detector",
        )?;
        let undersized_total = IntCounter::new(
            "iris_capture_undersized_total",
            "Eye boxes discarded for being below the minimum size",
        )?;
        let invalid_regions_total = IntCounter::new(
            "iris_capture_invalid_regions_total",
            "Boxes with no area left after clipping",
        )?;
        let malformed_frames_total = IntCounter::new(
            "iris_capture_malformed_frames_total",
            "Frames whose buffer did not match their declared layout",
        )?;

        let rejections_total = IntCounterVec::new(
            Opts::new(
                "iris_capture_rejections_total",
                "Eye candidates rejected, by the first failing gate",
            ),
            &["gate"],
        )?;
        // Materialize every label so all gates show up from the start
        for gate in Gate::ALL {
            rejections_total.with_label_values(&[gate.as_str()]);
        }

        registry.register(Box::new(frames_total.clone()))?;
        registry.register(Box::new(accepted.clone()))?;
        registry.register(Box::new(quota.clone()))?;
        registry.register(Box::new(faces_total.clone()))?;
        registry.register(Box::new(eye_candidates_total.clone()))?;
        registry.register(Box::new(undersized_total.clone()))?;
        registry.register(Box::new(invalid_regions_total.clone()))?;
        registry.register(Box::new(malformed_frames_total.clone()))?;
        registry.register(Box::new(rejections_total.clone()))?;

        Ok(Self {
            registry,
            frames_total,
            accepted,
            quota,
            faces_total,
            eye_candidates_total,
            undersized_total,
            invalid_regions_total,
            malformed_frames_total,
            rejections_total,
        })
    }

    /// Updates all metrics from a snapshot of session state.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        let stats = &snapshot.stats;

        self.accepted.set(i64::from(snapshot.accepted));
        self.quota.set(i64::from(snapshot.quota));

        // For counters, we need to increment by the difference
        advance(&self.frames_total, stats.frames);
        advance(&self.faces_total, stats.faces);
        advance(&self.eye_candidates_total, stats.eye_candidates);
        advance(&self.undersized_total, stats.undersized);
        advance(&self.invalid_regions_total, stats.invalid_regions);
        advance(&self.malformed_frames_total, stats.malformed_frames);

        for gate in Gate::ALL {
            advance(
                &self.rejections_total.with_label_values(&[gate.as_str()]),
                stats.rejections(gate),
            );
        }
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}

/// Feeds every processed frame into a [`MetricsRegistry`].
pub struct MetricsObserver {
    registry: MetricsRegistry,
}

impl MetricsObserver {
    pub fn new(registry: MetricsRegistry) -> Self {
        Self { registry }
    }
}

impl FrameObserver for MetricsObserver {
    fn observe(&mut self, _frame: &Frame, step: &StepReport) {
        self.registry.update(&MetricsSnapshot::from_step(step));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_metrics_update() {
        let registry = MetricsRegistry::new().unwrap();

        let mut stats = CaptureStats {
            frames: 12,
            faces: 9,
            eye_candidates: 15,
            accepted: 4,
            ..Default::default()
        };
        stats.record_rejection(Gate::Sharpness);
        stats.record_rejection(Gate::Sharpness);

        registry.update(&MetricsSnapshot::from_stats(&stats, 10));

        let output = registry.encode().unwrap();
        assert!(output.contains("iris_capture_frames_total 12"));
        assert!(output.contains("iris_capture_accepted 4"));
        assert!(output.contains("iris_capture_quota 10"));
        assert!(output.contains("iris_capture_rejections_total{gate=\"sharpness\"} 2"));
    }

    #[test]
    fn test_counters_never_go_backwards() {
        let registry = MetricsRegistry::new().unwrap();

        let stats = CaptureStats {
            frames: 5,
            ..Default::default()
        };
        registry.update(&MetricsSnapshot::from_stats(&stats, 10));
        registry.update(&MetricsSnapshot::from_stats(&CaptureStats::default(), 10));

        let output = registry.encode().unwrap();
        assert!(output.contains("iris_capture_frames_total 5"));
    }

    #[test]
    fn test_metrics_encode() {
        let registry = MetricsRegistry::new().unwrap();
        let output = registry.encode().unwrap();

        assert!(output.contains("iris_capture_frames_total"));
        assert!(output.contains("iris_capture_rejections_total{gate=\"circularity\"} 0"));
        assert!(output.contains("iris_capture_undersized_total"));
    }
}
