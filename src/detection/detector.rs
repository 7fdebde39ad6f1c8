//! The region detection seam.
//!
//! Detection itself lives outside this crate; the capture controller only
//! consumes boxes. Implementations are expected to be noisy: false
//! positives are filtered by the quality gates and misses are normal.

use super::Region;
use crate::capture::DetectionConfig;
use image::GrayImage;

/// Multi-scale scan parameters handed to a detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanParams {
    /// Pyramid scale step between scan passes.
    pub scale_factor: f64,
    /// Minimum overlapping hits before a box is reported.
    pub min_neighbors: u32,
    /// Smallest box side the detector should look for.
    pub min_size: u32,
}

impl DetectionConfig {
    /// Parameters for the face pass.
    pub fn face_params(&self) -> ScanParams {
        ScanParams {
            scale_factor: self.face_scale_factor,
            min_neighbors: self.face_min_neighbors,
            min_size: 0,
        }
    }

    /// Parameters for the eye pass.
    pub fn eye_params(&self) -> ScanParams {
        ScanParams {
            scale_factor: self.eye_scale_factor,
            min_neighbors: self.eye_min_neighbors,
            min_size: self.min_eye_size,
        }
    }
}

/// Locates faces in a frame and eyes within a face.
///
/// Neither method can fail: "nothing found" is an empty vector. Returned
/// boxes are relative to the image passed in and may extend past its
/// edges; callers clip them.
pub trait RegionDetector {
    /// Finds face boxes in a full grayscale frame.
    fn detect_faces(&mut self, frame: &GrayImage, params: &ScanParams) -> Vec<Region>;

    /// Finds eye boxes inside a grayscale face sub-image.
    fn detect_eyes(&mut self, face: &GrayImage, params: &ScanParams) -> Vec<Region>;
}

impl<D: RegionDetector + ?Sized> RegionDetector for Box<D> {
    fn detect_faces(&mut self, frame: &GrayImage, params: &ScanParams) -> Vec<Region> {
        (**self).detect_faces(frame, params)
    }

    fn detect_eyes(&mut self, face: &GrayImage, params: &ScanParams) -> Vec<Region> {
        (**self).detect_eyes(face, params)
    }
}
