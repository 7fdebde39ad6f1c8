//! Position test: is the eye roughly in front of the camera?

use crate::detection::Region;

/// Offset of a region's centre from the frame centre, as a fraction of the
/// frame's width and height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterOffset {
    pub dx: f64,
    pub dy: f64,
}

/// Computes the relative centre offset of `region` (frame coordinates).
///
/// Returns `None` for a frame without area.
pub fn center_offset(region: &Region, frame_width: u32, frame_height: u32) -> Option<CenterOffset> {
    if frame_width == 0 || frame_height == 0 {
        return None;
    }
    let (cx, cy) = region.center();
    let (fw, fh) = (f64::from(frame_width), f64::from(frame_height));
    Some(CenterOffset {
        dx: (cx - fw / 2.0).abs() / fw,
        dy: (cy - fh / 2.0).abs() / fh,
    })
}

/// Passes iff the centre offset is strictly below `margin` on both axes.
pub fn is_centered(region: &Region, frame_width: u32, frame_height: u32, margin: f64) -> bool {
    center_offset(region, frame_width, frame_height)
        .is_some_and(|offset| offset.dx < margin && offset.dy < margin)
}
