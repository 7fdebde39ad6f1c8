//! Face and eye localization.
//!
//! Region types plus the detector trait the capture controller drives.
//! No detection algorithm is implemented here beyond fixed guide boxes.

mod detector;
mod guide;
mod region;

pub use detector::{RegionDetector, ScanParams};
pub use guide::FixedLayoutDetector;
pub use region::Region;
