//! Focus measure: variance of the Laplacian.
//!
//! Blur removes high-frequency energy, so the spread of a second-derivative
//! response collapses on defocused or motion-smeared captures.

use super::statistics::mean_and_variance;
use image::GrayImage;

/// 4-neighbour Laplacian response of every pixel.
///
/// Borders are handled by mirroring without repeating the edge pixel
/// (`dcb|abcd|cba`).
pub fn laplacian(gray: &GrayImage) -> Vec<f64> {
    let (width, height) = gray.dimensions();
    let (w, h) = (i64::from(width), i64::from(height));
    let at = |x: i64, y: i64| -> f64 {
        f64::from(gray.get_pixel(reflect_101(x, w), reflect_101(y, h)).0[0])
    };

    let mut response = Vec::with_capacity((width as usize) * (height as usize));
    for y in 0..h {
        for x in 0..w {
            let neighbours = at(x - 1, y) + at(x + 1, y) + at(x, y - 1) + at(x, y + 1);
            response.push(neighbours - 4.0 * at(x, y));
        }
    }
    response
}

fn reflect_101(i: i64, n: i64) -> u32 {
    let mirrored = if n == 1 {
        0
    } else if i < 0 {
        -i
    } else if i >= n {
        2 * n - 2 - i
    } else {
        i
    };
    mirrored as u32
}

/// Variance of the Laplacian response; 0.0 for an empty image.
pub fn laplacian_variance(gray: &GrayImage) -> f64 {
    mean_and_variance(&laplacian(gray)).1
}

/// Passes iff the Laplacian variance is strictly above `threshold`.
pub fn is_sharp(gray: &GrayImage, threshold: f64) -> bool {
    laplacian_variance(gray) > threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{imageops, Luma};

    fn checkerboard(size: u32, cell: u32) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| {
            if (x / cell + y / cell) % 2 == 0 {
                Luma([0])
            } else {
                Luma([255])
            }
        })
    }

    #[test]
    fn test_flat_image_has_no_edge_energy() {
        let flat = GrayImage::from_pixel(32, 32, Luma([128]));
        assert_eq!(laplacian_variance(&flat), 0.0);
        assert!(!is_sharp(&flat, 100.0));
    }

    #[test]
    fn test_sharp_pattern_passes_and_blur_fails() {
        let sharp = checkerboard(64, 4);
        let blurred = imageops::blur(&sharp, 8.0);

        assert!(is_sharp(&sharp, 100.0));
        assert!(!is_sharp(&blurred, 100.0));
        assert!(laplacian_variance(&blurred) < laplacian_variance(&sharp));
    }

    #[test]
    fn test_single_pixel_image() {
        let dot = GrayImage::from_pixel(1, 1, Luma([200]));
        assert_eq!(laplacian(&dot), vec![0.0]);
    }

    #[test]
    fn test_reflect_101_borders() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(2, 5), 2);
        assert_eq!(reflect_101(-1, 1), 0);
    }
}
