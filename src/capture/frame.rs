//! Frame type representing a captured image with metadata.

use crate::detection::Region;
use image::{imageops, DynamicImage, GrayImage, RgbImage};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Pixel layout of a frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// One byte per pixel, intensity.
    #[default]
    Gray8,
    /// Three bytes per pixel, interleaved R, G, B.
    Rgb8,
}

impl PixelFormat {
    /// Bytes used by a single pixel.
    #[inline]
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgb8 => 3,
        }
    }
}

/// A single captured frame from the camera.
///
/// Frames are ephemeral: the capture controller owns each one for the
/// duration of a single scanning step and drops it afterwards.
#[derive(Clone)]
pub struct Frame {
    /// Raw pixel data laid out according to `format`.
    pixels: Vec<u8>,
    /// Frame width in pixels.
    width: u32,
    /// Frame height in pixels.
    height: u32,
    /// Pixel layout.
    format: PixelFormat,
    /// Capture timestamp.
    timestamp: Instant,
    /// Monotonic sequence number.
    sequence: u64,
}

impl Frame {
    /// Creates a new frame with the given parameters.
    pub fn new(
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
        sequence: u64,
    ) -> Self {
        Self {
            pixels,
            width,
            height,
            format,
            timestamp: Instant::now(),
            sequence,
        }
    }

    /// Wraps a grayscale image buffer as a frame.
    pub fn from_gray(image: GrayImage, sequence: u64) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, PixelFormat::Gray8, sequence)
    }

    /// Wraps an RGB image buffer as a frame.
    pub fn from_rgb(image: RgbImage, sequence: u64) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, PixelFormat::Rgb8, sequence)
    }

    /// Returns a reference to the raw pixel data.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the frame width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the frame height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the pixel layout.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Returns the capture timestamp.
    #[inline]
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Returns the sequence number.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the total number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// The whole frame as a region, used to clip detector output.
    pub fn bounds(&self) -> Region {
        Region::new(0, 0, self.width, self.height)
    }

    /// Validates that the pixel buffer size matches dimensions and format.
    pub fn is_valid(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.pixels.len() == self.pixel_count() * self.format.bytes_per_pixel()
    }

    /// Converts the frame to an 8-bit grayscale image.
    ///
    /// Returns `None` when the buffer does not match the declared layout.
    pub fn to_gray(&self) -> Option<GrayImage> {
        if !self.is_valid() {
            return None;
        }
        match self.format {
            PixelFormat::Gray8 => GrayImage::from_raw(self.width, self.height, self.pixels.clone()),
            PixelFormat::Rgb8 => RgbImage::from_raw(self.width, self.height, self.pixels.clone())
                .map(|rgb| DynamicImage::ImageRgb8(rgb).into_luma8()),
        }
    }
}

/// Copies `region` out of a grayscale image.
///
/// The region is clipped to the image first; `None` means nothing is left.
pub fn crop_gray(image: &GrayImage, region: &Region) -> Option<GrayImage> {
    let (width, height) = image.dimensions();
    let clipped = region.clip_to(&Region::new(0, 0, width, height))?;
    let view = imageops::crop_imm(
        image,
        clipped.x,
        clipped.y,
        clipped.width,
        clipped.height,
    );
    Some(view.to_image())
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("sequence", &self.sequence)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}
