//! Candidate regions and the battery's verdict on them.

use super::{Gate, GateViolation};
use crate::detection::Region;
use image::GrayImage;

/// A grayscale eye crop together with where it sits in the frame.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    /// Grayscale pixels of the eye region.
    pub pixels: &'a GrayImage,
    /// Eye region in full-frame coordinates.
    pub placement: Region,
    /// Width of the source frame.
    pub frame_width: u32,
    /// Height of the source frame.
    pub frame_height: u32,
}

impl<'a> Candidate<'a> {
    pub fn new(pixels: &'a GrayImage, placement: Region, frame_width: u32, frame_height: u32) -> Self {
        Self {
            pixels,
            placement,
            frame_width,
            frame_height,
        }
    }
}

/// Outcome of running every gate on one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityVerdict {
    violation: Option<GateViolation>,
}

impl QualityVerdict {
    /// A verdict with every gate passed.
    pub fn accepted() -> Self {
        Self { violation: None }
    }

    /// True when every gate passed.
    pub fn is_accepted(&self) -> bool {
        self.violation.is_none()
    }

    /// The first gate that failed, if any.
    pub fn failed_gate(&self) -> Option<Gate> {
        self.violation.as_ref().map(GateViolation::gate)
    }

    /// Details of the first failure, if any.
    pub fn violation(&self) -> Option<&GateViolation> {
        self.violation.as_ref()
    }
}

impl From<Result<(), GateViolation>> for QualityVerdict {
    fn from(result: Result<(), GateViolation>) -> Self {
        Self {
            violation: result.err(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::GateThresholds;
    use proptest::prelude::*;

    #[test]
    fn test_verdict_from_violation() {
        let verdict = QualityVerdict::from(Err(GateViolation::Blurry {
            observed: 12.0,
            threshold: 100.0,
        }));
        assert!(!verdict.is_accepted());
        assert_eq!(verdict.failed_gate(), Some(Gate::Sharpness));
        assert!(QualityVerdict::accepted().is_accepted());
    }

    proptest! {
        #[test]
        fn evaluation_is_idempotent(
            pixels in proptest::collection::vec(any::<u8>(), 24 * 24),
            x in 0u32..600, y in 0u32..440,
        ) {
            let image = GrayImage::from_raw(24, 24, pixels).unwrap();
            let candidate = Candidate::new(&image, Region::new(x, y, 24, 24), 640, 480);
            let thresholds = GateThresholds::default();

            let first = thresholds.evaluate(&candidate);
            let second = thresholds.evaluate(&candidate);
            prop_assert_eq!(first, second);
        }
    }
}
