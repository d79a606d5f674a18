//! DocAlign aligns a photographed document to a reference template.
//!
//! Keypoints are extracted from both images, matched by binary descriptor
//! distance and filtered to the strongest pairs. A robust homography fit
//! then maps the photograph into the template frame, and a side-by-side
//! diagnostic of the matches is rendered on every call, including failed
//! ones.
//!
//! Keypoint extraction and homography fitting sit behind the
//! [`KeypointExtractor`] and [`RobustHomographyFitter`] traits; the
//! built-in [`OrbExtractor`] and [`RansacHomography`] are used by default.
//! The optional `rayon` feature runs extraction and matching in parallel,
//! `image-io` adds file loading and saving, and `tracing` emits spans and
//! events for each stage.

pub mod features;
pub mod geometry;
pub mod image;
pub mod lowlevel;
pub mod matching;
mod pipeline;
pub mod rectify;
mod trace;
pub mod util;
pub mod visualize;

pub use features::{Descriptor, Keypoint, KeypointExtractor, OrbConfig, OrbExtractor};
pub use geometry::{Homography, HomographyFit, RansacConfig, RansacHomography, RobustHomographyFitter};
pub use self::image::gray::to_gray;
pub use self::image::{GrayImage, Image, ImageView};
pub use matching::Correspondence;
pub use pipeline::{scan, ScanConfig, ScanOutcome, Scanner};
pub use util::{DocAlignError, DocAlignResult};

#[cfg(feature = "image-io")]
pub use self::image::io;
