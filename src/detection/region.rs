//! Axis-aligned rectangles relative to a parent image.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle.
///
/// Coordinates are relative to whatever the region was detected in: the
/// full frame for faces, the face sub-image for eyes. A zero-area region is
/// never valid input to the quality gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Region {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Number of pixels covered.
    #[inline]
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Exclusive right edge.
    #[inline]
    pub fn right(&self) -> u64 {
        u64::from(self.x) + u64::from(self.width)
    }

    /// Exclusive bottom edge.
    #[inline]
    pub fn bottom(&self) -> u64 {
        u64::from(self.y) + u64::from(self.height)
    }

    /// Geometric centre, in the same coordinate space as the region.
    pub fn center(&self) -> (f64, f64) {
        (
            f64::from(self.x) + f64::from(self.width) / 2.0,
            f64::from(self.y) + f64::from(self.height) / 2.0,
        )
    }

    /// Whether pixel `(x, y)` lies inside the region.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && u64::from(x) < self.right() && y >= self.y && u64::from(y) < self.bottom()
    }

    /// Whether both sides reach `min_side`.
    pub fn meets_min_size(&self, min_side: u32) -> bool {
        self.width >= min_side && self.height >= min_side
    }

    /// Intersection with `bounds`; `None` when nothing of the region remains.
    pub fn clip_to(&self, bounds: &Region) -> Option<Region> {
        let left = self.x.max(bounds.x);
        let top = self.y.max(bounds.y);
        let right = self.right().min(bounds.right());
        let bottom = self.bottom().min(bounds.bottom());

        if right <= u64::from(left) || bottom <= u64::from(top) {
            return None;
        }
        // Both extents are bounded by a u32 width/height.
        Some(Region::new(
            left,
            top,
            (right - u64::from(left)) as u32,
            (bottom - u64::from(top)) as u32,
        ))
    }

    /// Translates a region expressed relative to `parent` into the parent's
    /// own coordinate space.
    pub fn offset_by(&self, parent: &Region) -> Region {
        Region::new(
            self.x.saturating_add(parent.x),
            self.y.saturating_add(parent.y),
            self.width,
            self.height,
        )
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{}+{}+{}",
            self.width, self.height, self.x, self.y
        )
    }
}
