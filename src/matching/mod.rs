//! Brute-force Hamming descriptor matching.
//!
//! Every template keypoint is paired with its nearest image keypoint. Ties
//! go to the lowest image index and no reverse (image to template) check is
//! made, so several template keypoints may share one image keypoint. The
//! correspondence filter is trusted to remove the weak pairs.

pub mod filter;

pub use filter::{require_minimum, retain_best, retained_count, MIN_CORRESPONDENCES};

use crate::features::Keypoint;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Candidate pairing between a template keypoint and an image keypoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Correspondence {
    /// Index into the template keypoints.
    pub template_idx: usize,
    /// Index into the image keypoints.
    pub image_idx: usize,
    /// Hamming distance between the two descriptors (lower is better).
    pub distance: u32,
}

/// Finds the nearest image keypoint for one template keypoint.
#[inline]
fn nearest(template_idx: usize, query: &Keypoint, image: &[Keypoint]) -> Option<Correspondence> {
    let mut best: Option<Correspondence> = None;
    for (image_idx, candidate) in image.iter().enumerate() {
        let distance = query.descriptor.hamming(&candidate.descriptor);
        // Strict comparison keeps the lowest index on ties.
        if best.map_or(true, |b| distance < b.distance) {
            best = Some(Correspondence {
                template_idx,
                image_idx,
                distance,
            });
        }
    }
    best
}

/// Matches each template keypoint to its nearest image keypoint.
///
/// Output is in template keypoint order with exactly one entry per template
/// keypoint, or empty when `image` has no keypoints.
pub fn match_descriptors(template: &[Keypoint], image: &[Keypoint]) -> Vec<Correspondence> {
    template
        .iter()
        .enumerate()
        .filter_map(|(idx, kp)| nearest(idx, kp, image))
        .collect()
}

/// Parallel variant of [`match_descriptors`] with identical output.
#[cfg(feature = "rayon")]
pub fn match_descriptors_par(template: &[Keypoint], image: &[Keypoint]) -> Vec<Correspondence> {
    template
        .par_iter()
        .enumerate()
        .filter_map(|(idx, kp)| nearest(idx, kp, image))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{match_descriptors, Correspondence};
    use crate::features::{Descriptor, Keypoint};

    pub(crate) fn keypoint_with(bits: &[usize], x: f32, y: f32) -> Keypoint {
        let mut bytes = [0u8; 32];
        for &bit in bits {
            bytes[bit / 8] |= 1 << (bit % 8);
        }
        Keypoint {
            x,
            y,
            response: 1.0,
            angle: 0.0,
            level: 0,
            descriptor: Descriptor(bytes),
        }
    }

    #[test]
    fn nearest_neighbor_is_selected() {
        let template = vec![keypoint_with(&[0, 1, 2], 0.0, 0.0)];
        let image = vec![
            keypoint_with(&[10, 11, 12, 13], 0.0, 0.0),
            keypoint_with(&[0, 1], 0.0, 0.0),
            keypoint_with(&[0, 1, 2, 3, 4], 0.0, 0.0),
        ];
        let matches = match_descriptors(&template, &image);
        assert_eq!(
            matches,
            vec![Correspondence {
                template_idx: 0,
                image_idx: 1,
                distance: 1,
            }]
        );
    }

    #[test]
    fn ties_resolve_to_lowest_image_index() {
        let template = vec![keypoint_with(&[5], 0.0, 0.0)];
        let image = vec![
            keypoint_with(&[7], 0.0, 0.0),
            keypoint_with(&[6], 0.0, 0.0),
            keypoint_with(&[8], 0.0, 0.0),
        ];
        let matches = match_descriptors(&template, &image);
        assert_eq!(matches[0].image_idx, 0);
        assert_eq!(matches[0].distance, 2);
    }

    #[test]
    fn one_candidate_per_template_keypoint_without_cross_check() {
        let template = vec![
            keypoint_with(&[1], 0.0, 0.0),
            keypoint_with(&[1, 2], 0.0, 0.0),
            keypoint_with(&[200], 0.0, 0.0),
        ];
        let image = vec![keypoint_with(&[1], 0.0, 0.0)];
        let matches = match_descriptors(&template, &image);
        assert_eq!(matches.len(), 3);
        assert!(matches.iter().all(|m| m.image_idx == 0));
        let order: Vec<usize> = matches.iter().map(|m| m.template_idx).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn empty_image_set_yields_no_candidates() {
        let template = vec![keypoint_with(&[1], 0.0, 0.0)];
        assert!(match_descriptors(&template, &[]).is_empty());
        assert!(match_descriptors(&[], &template).is_empty());
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn parallel_matching_matches_sequential() {
        let template: Vec<Keypoint> = (0..64)
            .map(|i| keypoint_with(&[i, (i * 7) % 256, (i * 13) % 256], 0.0, 0.0))
            .collect();
        let image: Vec<Keypoint> = (0..48)
            .map(|i| keypoint_with(&[(i * 5) % 256, (i * 11) % 256], 0.0, 0.0))
            .collect();
        assert_eq!(
            match_descriptors(&template, &image),
            super::match_descriptors_par(&template, &image)
        );
    }
}
