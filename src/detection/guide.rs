//! Fixed guide-box detection.
//!
//! Capture rigs with a chin rest (and the synthetic demo scene) put the
//! subject's eye in a known place. This detector reports those boxes on
//! every frame and lets the quality gates decide whether the eye is
//! actually there and usable.

use super::{Region, RegionDetector, ScanParams};
use crate::capture::{DetectionConfig, SyntheticScene};
use image::GrayImage;

/// Detector that always reports the same face and eye boxes.
#[derive(Debug, Clone, Default)]
pub struct FixedLayoutDetector {
    faces: Vec<Region>,
    eyes: Vec<Region>,
}

impl FixedLayoutDetector {
    /// Reports `faces` in frame coordinates and `eyes` relative to each face.
    pub fn new(faces: Vec<Region>, eyes: Vec<Region>) -> Self {
        Self { faces, eyes }
    }

    /// Builds a detector from the configured guide boxes, if both are set.
    pub fn from_config(config: &DetectionConfig) -> Option<Self> {
        let face = config.guide_face?;
        let eye = config.guide_eye?;
        Some(Self::new(vec![face], vec![eye]))
    }

    /// Builds a detector matching a synthetic scene's layout.
    pub fn for_scene(scene: &SyntheticScene) -> Self {
        Self::new(
            scene.face.into_iter().collect(),
            scene.eye.into_iter().collect(),
        )
    }
}

impl RegionDetector for FixedLayoutDetector {
    fn detect_faces(&mut self, _frame: &GrayImage, _params: &ScanParams) -> Vec<Region> {
        self.faces.clone()
    }

    fn detect_eyes(&mut self, _face: &GrayImage, _params: &ScanParams) -> Vec<Region> {
        self.eyes.clone()
    }
}
