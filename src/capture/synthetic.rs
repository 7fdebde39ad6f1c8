//! Synthetic scenes for demos and tests.
//!
//! A scene is a flat background with an optional face box and an iris disk
//! inscribed in an eye box inside that face. It is sharp, high contrast and
//! round by construction, so a centred scene passes every quality gate.

use crate::detection::Region;
use image::{GrayImage, Luma, Rgb, RgbImage};

/// Layout and intensities of a rendered test scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticScene {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Face box in frame coordinates.
    pub face: Option<Region>,
    /// Eye box relative to `face`; the iris disk is inscribed in it.
    pub eye: Option<Region>,
    /// Intensity outside the face.
    pub background: u8,
    /// Intensity inside the face, around the iris.
    pub skin: u8,
    /// Intensity of the iris disk.
    pub iris: u8,
}

impl SyntheticScene {
    /// An empty scene: background only.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            face: None,
            eye: None,
            background: 90,
            skin: 30,
            iris: 220,
        }
    }

    /// A face centred in the frame with one eye centred in the face.
    pub fn centered_eye(width: u32, height: u32) -> Self {
        let face_side = width.min(height) / 2;
        let eye_side = face_side / 2;
        let face = Region::new(
            (width - face_side) / 2,
            (height - face_side) / 2,
            face_side,
            face_side,
        );
        let eye = Region::new(
            (face_side - eye_side) / 2,
            (face_side - eye_side) / 2,
            eye_side,
            eye_side,
        );
        Self::blank(width, height).with_face(face, eye)
    }

    /// Places a face and an eye (relative to the face).
    pub fn with_face(mut self, face: Region, eye: Region) -> Self {
        self.face = Some(face);
        self.eye = Some(eye);
        self
    }

    /// The eye box in frame coordinates, if the scene has one.
    pub fn eye_in_frame(&self) -> Option<Region> {
        Some(self.eye?.offset_by(&self.face?))
    }

    /// Renders the scene as an 8-bit grayscale image.
    pub fn render_gray(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| Luma([self.intensity_at(x, y)]))
    }

    /// Renders the scene as an RGB image with equal channels.
    pub fn render_rgb(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let v = self.intensity_at(x, y);
            Rgb([v, v, v])
        })
    }

    fn intensity_at(&self, x: u32, y: u32) -> u8 {
        let Some(face) = self.face else {
            return self.background;
        };
        if !face.contains(x, y) {
            return self.background;
        }
        match self.eye_in_frame() {
            Some(eye) if in_inscribed_disk(&eye, x, y) => self.iris,
            _ => self.skin,
        }
    }
}

/// Whether pixel `(x, y)` falls inside the disk inscribed in `bounds`,
/// leaving a small ring of skin around it.
fn in_inscribed_disk(bounds: &Region, x: u32, y: u32) -> bool {
    let (cx, cy) = bounds.center();
    let radius = f64::from(bounds.width.min(bounds.height)) / 2.0 - 3.0;
    if radius <= 0.0 {
        return false;
    }
    let dx = f64::from(x) + 0.5 - cx;
    let dy = f64::from(y) + 0.5 - cy;
    dx * dx + dy * dy <= radius * radius
}
