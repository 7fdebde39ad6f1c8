//! Shape test for an iris-like blob.

use super::contour::{binarize, external_contours};
use image::GrayImage;

/// Highest circularity among the external contours of the binarized
/// region, or `None` when no contour has a non-zero perimeter.
pub fn max_circularity(gray: &GrayImage, cutoff: u8) -> Option<f64> {
    external_contours(&binarize(gray, cutoff))
        .iter()
        .filter_map(|contour| contour.circularity())
        .reduce(f64::max)
}

/// Passes iff some external contour is strictly rounder than `threshold`.
///
/// A perfect disk scores about 1.0; partial occlusion by eyelids or glare
/// lowers the score, which a threshold well below 1.0 tolerates.
pub fn is_circular(gray: &GrayImage, cutoff: u8, threshold: f64) -> bool {
    max_circularity(gray, cutoff).is_some_and(|best| best > threshold)
}
