//! Gate thresholds and violations.
//!
//! A candidate is accepted only when every gate passes. Gates run cheapest
//! first so a rejected candidate rarely pays for contour tracing.

use super::{
    centering::center_offset, circularity::max_circularity, contrast::intensity_std_dev,
    sharpness::laplacian_variance, verdict::Candidate, QualityVerdict,
};
use crate::capture::ConfigError;
use serde::{Deserialize, Serialize};

/// The four quality gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gate {
    Centering,
    Contrast,
    Sharpness,
    Circularity,
}

impl Gate {
    /// Evaluation order.
    pub const ALL: [Gate; 4] = [
        Gate::Centering,
        Gate::Contrast,
        Gate::Sharpness,
        Gate::Circularity,
    ];

    /// Stable lowercase name, used in logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Gate::Centering => "centering",
            Gate::Contrast => "contrast",
            Gate::Sharpness => "sharpness",
            Gate::Circularity => "circularity",
        }
    }
}

impl std::fmt::Display for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quality thresholds for candidate eye regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateThresholds {
    /// Minimum Laplacian variance (exclusive).
    pub sharpness: f64,
    /// Minimum intensity standard deviation (exclusive).
    pub contrast: f64,
    /// Minimum best-contour circularity (exclusive).
    pub circularity: f64,
    /// Maximum centre offset as a fraction of the frame size (exclusive).
    pub centering_margin: f64,
    /// Intensity above which a pixel is foreground for contour extraction.
    pub binarize_cutoff: u8,
}

impl Default for GateThresholds {
    fn default() -> Self {
        Self {
            sharpness: 100.0,
            contrast: 30.0,
            circularity: 0.4,
            centering_margin: 0.3,
            binarize_cutoff: 50,
        }
    }
}

impl GateThresholds {
    /// Validates the thresholds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.sharpness.is_finite() || self.sharpness < 0.0 {
            return Err(ConfigError::InvalidThreshold(format!(
                "sharpness {} must be finite and non-negative",
                self.sharpness
            )));
        }
        if !self.contrast.is_finite() || self.contrast < 0.0 {
            return Err(ConfigError::InvalidThreshold(format!(
                "contrast {} must be finite and non-negative",
                self.contrast
            )));
        }
        if !(0.0..=1.0).contains(&self.circularity) {
            return Err(ConfigError::InvalidThreshold(format!(
                "circularity {} must be within [0, 1]",
                self.circularity
            )));
        }
        if !(self.centering_margin > 0.0 && self.centering_margin <= 1.0) {
            return Err(ConfigError::InvalidThreshold(format!(
                "centering margin {} must be within (0, 1]",
                self.centering_margin
            )));
        }
        Ok(())
    }

    /// Checks a candidate against every gate, reporting the first failure.
    pub fn check(&self, candidate: &Candidate<'_>) -> Result<(), GateViolation> {
        for gate in Gate::ALL {
            self.check_gate(gate, candidate)?;
        }
        Ok(())
    }

    /// Checks a single gate.
    pub fn check_gate(&self, gate: Gate, candidate: &Candidate<'_>) -> Result<(), GateViolation> {
        match gate {
            Gate::Centering => {
                let offset = center_offset(
                    &candidate.placement,
                    candidate.frame_width,
                    candidate.frame_height,
                );
                let centred = offset.is_some_and(|o| {
                    o.dx < self.centering_margin && o.dy < self.centering_margin
                });
                if !centred {
                    let (dx, dy) = offset.map_or((f64::INFINITY, f64::INFINITY), |o| (o.dx, o.dy));
                    return Err(GateViolation::OffCenter {
                        dx,
                        dy,
                        margin: self.centering_margin,
                    });
                }
            }
            Gate::Contrast => {
                let observed = intensity_std_dev(candidate.pixels);
                if !(observed > self.contrast) {
                    return Err(GateViolation::LowContrast {
                        observed,
                        threshold: self.contrast,
                    });
                }
            }
            Gate::Sharpness => {
                let observed = laplacian_variance(candidate.pixels);
                if !(observed > self.sharpness) {
                    return Err(GateViolation::Blurry {
                        observed,
                        threshold: self.sharpness,
                    });
                }
            }
            Gate::Circularity => {
                let observed = max_circularity(candidate.pixels, self.binarize_cutoff);
                if !observed.is_some_and(|best| best > self.circularity) {
                    return Err(GateViolation::NotCircular {
                        observed: observed.unwrap_or(0.0),
                        threshold: self.circularity,
                    });
                }
            }
        }
        Ok(())
    }

    /// Runs the full battery and wraps the outcome as a verdict.
    pub fn evaluate(&self, candidate: &Candidate<'_>) -> QualityVerdict {
        QualityVerdict::from(self.check(candidate))
    }
}

/// Gate failure with the observed value that caused it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GateViolation {
    #[error("centre offset ({dx:.3}, {dy:.3}) not within margin {margin:.3}")]
    OffCenter { dx: f64, dy: f64, margin: f64 },

    #[error("contrast {observed:.2} not above threshold {threshold:.2}")]
    LowContrast { observed: f64, threshold: f64 },

    #[error("sharpness {observed:.2} not above threshold {threshold:.2}")]
    Blurry { observed: f64, threshold: f64 },

    #[error("circularity {observed:.3} not above threshold {threshold:.3}")]
    NotCircular { observed: f64, threshold: f64 },
}

impl GateViolation {
    /// The gate that produced this violation.
    pub fn gate(&self) -> Gate {
        match self {
            GateViolation::OffCenter { .. } => Gate::Centering,
            GateViolation::LowContrast { .. } => Gate::Contrast,
            GateViolation::Blurry { .. } => Gate::Sharpness,
            GateViolation::NotCircular { .. } => Gate::Circularity,
        }
    }
}
