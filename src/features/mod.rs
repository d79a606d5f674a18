//! Keypoints, binary descriptors, and the keypoint extractor seam.
//!
//! The pipeline only depends on [`KeypointExtractor`]; [`OrbExtractor`] is
//! the built-in implementation and can be swapped for any detector that
//! produces 256-bit binary descriptors.

pub mod fast;
pub mod orb;

pub use orb::{OrbConfig, OrbExtractor};

use crate::image::ImageView;
use crate::util::DocAlignResult;

/// Number of bytes in a binary descriptor (256 bits).
pub const DESCRIPTOR_BYTES: usize = 32;

/// Fixed-length binary descriptor compared with the Hamming distance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Descriptor(pub [u8; DESCRIPTOR_BYTES]);

impl Descriptor {
    /// Returns the number of differing bits between two descriptors.
    #[inline]
    pub fn hamming(&self, other: &Descriptor) -> u32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }

    /// Returns the bit at `index` (0..256).
    pub fn bit(&self, index: usize) -> bool {
        (self.0[index / 8] >> (index % 8)) & 1 == 1
    }
}

/// A located, described image feature.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keypoint {
    /// X coordinate in level-0 pixels.
    pub x: f32,
    /// Y coordinate in level-0 pixels.
    pub y: f32,
    /// Detector response (higher is more salient).
    pub response: f32,
    /// Orientation in radians.
    pub angle: f32,
    /// Pyramid level the keypoint was detected on.
    pub level: u8,
    /// Binary appearance descriptor.
    pub descriptor: Descriptor,
}

impl Keypoint {
    /// Returns the location as `[x, y]` in `f64`.
    pub fn point(&self) -> [f64; 2] {
        [f64::from(self.x), f64::from(self.y)]
    }
}

/// Produces keypoints with binary descriptors from a grayscale image.
///
/// Implementations return at most `budget` keypoints ranked by their own
/// saliency measure. Returning fewer, including none on a featureless
/// image, is not an error.
pub trait KeypointExtractor: Sync {
    /// Detects and describes keypoints in `image`.
    fn extract(&self, image: ImageView<'_, u8>, budget: usize) -> DocAlignResult<Vec<Keypoint>>;
}

impl<E: KeypointExtractor + ?Sized> KeypointExtractor for &E {
    fn extract(&self, image: ImageView<'_, u8>, budget: usize) -> DocAlignResult<Vec<Keypoint>> {
        (**self).extract(image, budget)
    }
}

#[cfg(test)]
mod tests {
    use super::Descriptor;

    #[test]
    fn hamming_counts_differing_bits() {
        let a = Descriptor([0u8; 32]);
        let mut bytes = [0u8; 32];
        bytes[0] = 0b1011;
        bytes[31] = 0xFF;
        let b = Descriptor(bytes);
        assert_eq!(a.hamming(&b), 11);
        assert_eq!(b.hamming(&a), 11);
        assert_eq!(b.hamming(&b), 0);
        assert!(b.bit(0) && b.bit(1) && !b.bit(2) && b.bit(3));
    }
}
