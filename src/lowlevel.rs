//! Individual pipeline stages for custom alignment flows.
//!
//! These functions are what [`crate::Scanner`] composes internally. Most
//! users should prefer `Scanner` or the top-level [`crate::scan`] function.

pub use crate::features::fast::{detect as detect_fast_corners, Corner};
pub use crate::geometry::fit_dlt;
pub use crate::image::gray::{luma, to_gray};
pub use crate::image::pyramid::ImagePyramid;
pub use crate::matching::{
    match_descriptors, require_minimum, retain_best, retained_count, MIN_CORRESPONDENCES,
};
#[cfg(feature = "rayon")]
pub use crate::matching::match_descriptors_par;
pub use crate::rectify::warp_perspective;
pub use crate::visualize::draw_matches;
