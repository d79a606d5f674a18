//! Result of a single scan.

use crate::geometry::Homography;
use crate::image::Image;
use crate::matching::Correspondence;
use crate::util::DocAlignError;

/// Everything a scan produced, successful or not.
///
/// The visualization is always present. On success `rectified` and
/// `homography` are set and `error` is `None`; on a partial failure
/// `rectified` is `None` and `error` says why.
#[derive(Clone, Debug)]
pub struct ScanOutcome {
    /// Input image resampled into the template frame.
    pub rectified: Option<Image>,
    /// Side-by-side match diagnostic.
    pub visualization: Image,
    /// Estimated image-to-template transform, when fitting succeeded.
    pub homography: Option<Homography>,
    /// Keypoints found on the input image.
    pub image_keypoints: usize,
    /// Keypoints found on the template.
    pub template_keypoints: usize,
    /// Candidate correspondences before filtering.
    pub candidates: usize,
    /// Correspondences that survived filtering, best first.
    pub correspondences: Vec<Correspondence>,
    /// Correspondences consistent with the estimated transform.
    pub inliers: usize,
    /// Why the scan stopped short of a rectified image.
    pub error: Option<DocAlignError>,
}

impl ScanOutcome {
    /// Returns true when a rectified image was produced.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.rectified.is_some()
    }

    /// User-facing error text, if any.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// Splits into `(rectified, visualization, error message)`.
    pub fn into_parts(self) -> (Option<Image>, Image, Option<String>) {
        let message = self.error_message();
        (self.rectified, self.visualization, message)
    }
}
