//! Global contrast: standard deviation of intensities.

use super::statistics::intensity_variance;
use image::GrayImage;

/// Standard deviation of the pixel intensities.
pub fn intensity_std_dev(gray: &GrayImage) -> f64 {
    intensity_variance(gray.as_raw()).sqrt()
}

/// Passes iff the intensity standard deviation is strictly above
/// `threshold`. Flat, washed-out and saturated crops fail.
pub fn has_sufficient_contrast(gray: &GrayImage, threshold: f64) -> bool {
    intensity_std_dev(gray) > threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_uniform_image_fails() {
        let flat = GrayImage::from_pixel(40, 40, Luma([180]));
        assert_eq!(intensity_std_dev(&flat), 0.0);
        assert!(!has_sufficient_contrast(&flat, 30.0));
    }

    #[test]
    fn test_checkerboard_passes() {
        let board = GrayImage::from_fn(40, 40, |x, y| {
            if (x / 5 + y / 5) % 2 == 0 {
                Luma([0])
            } else {
                Luma([255])
            }
        });
        assert!((intensity_std_dev(&board) - 127.5).abs() < 1e-9);
        assert!(has_sufficient_contrast(&board, 30.0));
    }

    #[test]
    fn test_threshold_is_strict() {
        // Two levels 60 apart: std dev is exactly 30
        let board = GrayImage::from_fn(10, 10, |x, _| {
            if x % 2 == 0 {
                Luma([100])
            } else {
                Luma([160])
            }
        });
        assert_eq!(intensity_std_dev(&board), 30.0);
        assert!(!has_sufficient_contrast(&board, 30.0));
    }
}
