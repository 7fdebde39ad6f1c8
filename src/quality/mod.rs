//! Image quality gates for candidate eye regions.
//!
//! Every gate is a pure function of grayscale pixels and a threshold; none
//! keeps state between calls, so evaluating the same region twice always
//! yields the same verdict.

mod centering;
mod circularity;
mod contour;
mod contrast;
mod sharpness;
mod statistics;
mod thresholds;
mod verdict;

pub use centering::{center_offset, is_centered, CenterOffset};
pub use circularity::{is_circular, max_circularity};
pub use contour::{binarize, external_contours, Contour};
pub use contrast::{has_sufficient_contrast, intensity_std_dev};
pub use sharpness::{is_sharp, laplacian, laplacian_variance};
pub use statistics::{intensity_variance, mean_and_variance};
pub use thresholds::{Gate, GateThresholds, GateViolation};
pub use verdict::{Candidate, QualityVerdict};
