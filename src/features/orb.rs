//! Oriented FAST and rotated BRIEF keypoint extraction.
//!
//! Each pyramid level is searched for FAST-9 corners ranked by Harris
//! response. The feature budget is split across levels geometrically (each
//! level gets half the quota of the previous one) and any unused quota rolls
//! over to the next level. Orientation comes from the intensity centroid of
//! a radius-15 disc, and the descriptor is a 256-bit BRIEF test pattern
//! rotated by that orientation and sampled on a binomially smoothed copy of
//! the level.
//!
//! The test pattern is drawn once from a seeded generator, so descriptors
//! are reproducible for a given `pattern_seed`.

use crate::features::fast;
use crate::features::{Descriptor, Keypoint, KeypointExtractor, DESCRIPTOR_BYTES};
use crate::image::pyramid::{smooth_binomial5, to_base_coord, ImagePyramid};
use crate::image::ImageView;
use crate::util::{DocAlignError, DocAlignResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Radius of the disc used for the intensity-centroid orientation.
const ORIENTATION_RADIUS: isize = 15;
/// Half extent of the BRIEF sampling square before rotation.
const PATTERN_HALF_EXTENT: i32 = 13;
/// Levels smaller than this on either side are not built.
const MIN_LEVEL_SIZE: usize = 32;

/// Configuration for the ORB extractor.
#[derive(Clone, Debug)]
pub struct OrbConfig {
    /// FAST intensity threshold.
    pub fast_threshold: u8,
    /// Maximum number of pyramid levels (each half the size of the previous).
    pub n_levels: usize,
    /// Harris detector free parameter.
    pub harris_k: f32,
    /// Minimum distance in level pixels between a keypoint and the border.
    pub edge_threshold: usize,
    /// Seed for the BRIEF test pattern.
    pub pattern_seed: u64,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            fast_threshold: 20,
            n_levels: 4,
            harris_k: 0.04,
            edge_threshold: 19,
            pattern_seed: 0x0b1e_5eed,
        }
    }
}

impl OrbConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> DocAlignResult<()> {
        if self.n_levels == 0 {
            return Err(DocAlignError::InvalidConfig("n_levels must be >= 1"));
        }
        if self.n_levels > 16 {
            return Err(DocAlignError::InvalidConfig("n_levels must be <= 16"));
        }
        if self.fast_threshold == 0 {
            return Err(DocAlignError::InvalidConfig("fast_threshold must be > 0"));
        }
        if !self.harris_k.is_finite() || self.harris_k < 0.0 {
            return Err(DocAlignError::InvalidConfig(
                "harris_k must be finite and >= 0",
            ));
        }
        if self.edge_threshold < fast::MIN_BORDER {
            return Err(DocAlignError::InvalidConfig("edge_threshold must be >= 4"));
        }
        Ok(())
    }
}

/// One BRIEF intensity comparison: bit is set when `I(a) < I(b)`.
#[derive(Clone, Copy, Debug)]
struct TestPair {
    a: (i32, i32),
    b: (i32, i32),
}

/// Built-in keypoint extractor (oriented FAST + rotated BRIEF).
#[derive(Clone, Debug)]
pub struct OrbExtractor {
    cfg: OrbConfig,
    pattern: Vec<TestPair>,
}

impl Default for OrbExtractor {
    fn default() -> Self {
        Self::build(OrbConfig::default())
    }
}

impl OrbExtractor {
    /// Creates an extractor after validating `cfg`.
    pub fn new(cfg: OrbConfig) -> DocAlignResult<Self> {
        cfg.validate()?;
        Ok(Self::build(cfg))
    }

    fn build(cfg: OrbConfig) -> Self {
        let pattern = generate_pattern(cfg.pattern_seed);
        Self { cfg, pattern }
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &OrbConfig {
        &self.cfg
    }

    fn describe(&self, smoothed: ImageView<'_, u8>, x: usize, y: usize, angle: f32) -> Descriptor {
        let (sin_a, cos_a) = angle.sin_cos();
        let mut bytes = [0u8; DESCRIPTOR_BYTES];
        for (bit, pair) in self.pattern.iter().enumerate() {
            let sample = |(dx, dy): (i32, i32)| {
                let (dx, dy) = (dx as f32, dy as f32);
                let rx = (cos_a * dx - sin_a * dy).round() as isize;
                let ry = (sin_a * dx + cos_a * dy).round() as isize;
                smoothed.at_clamped(x as isize + rx, y as isize + ry)
            };
            if sample(pair.a) < sample(pair.b) {
                bytes[bit / 8] |= 1 << (bit % 8);
            }
        }
        Descriptor(bytes)
    }
}

impl KeypointExtractor for OrbExtractor {
    fn extract(&self, image: ImageView<'_, u8>, budget: usize) -> DocAlignResult<Vec<Keypoint>> {
        if budget == 0 {
            return Ok(Vec::new());
        }

        let pyramid = ImagePyramid::build(image, self.cfg.n_levels, MIN_LEVEL_SIZE)?;
        let quotas = level_quotas(budget, pyramid.len());

        let mut keypoints = Vec::with_capacity(budget);
        let mut carry = 0usize;
        for (level_idx, level) in pyramid.levels().iter().enumerate() {
            let quota = quotas[level_idx] + carry;
            let view = level.view();

            let mut corners = fast::detect(
                view,
                self.cfg.fast_threshold,
                self.cfg.edge_threshold,
                self.cfg.harris_k,
            );
            // Stable: equal responses keep raster order.
            corners.sort_by(|a, b| b.response.total_cmp(&a.response));
            corners.truncate(quota);
            carry = quota - corners.len();
            if corners.is_empty() {
                continue;
            }

            let smoothed = smooth_binomial5(view)?;
            for corner in corners {
                let angle = intensity_centroid_angle(view, corner.x, corner.y);
                let descriptor = self.describe(smoothed.view(), corner.x, corner.y, angle);
                keypoints.push(Keypoint {
                    x: to_base_coord(corner.x as f32, level_idx),
                    y: to_base_coord(corner.y as f32, level_idx),
                    response: corner.response,
                    angle,
                    level: level_idx as u8,
                    descriptor,
                });
            }
        }

        keypoints.sort_by(|a, b| b.response.total_cmp(&a.response));
        keypoints.truncate(budget);
        Ok(keypoints)
    }
}

/// Splits `budget` across `levels` with a 1/2 ratio between consecutive levels.
fn level_quotas(budget: usize, levels: usize) -> Vec<usize> {
    if levels == 0 {
        return Vec::new();
    }
    let factor = 0.5f64;
    let first = budget as f64 * (1.0 - factor) / (1.0 - factor.powi(levels as i32));
    let mut quotas = Vec::with_capacity(levels);
    let mut assigned = 0usize;
    for level in 0..levels - 1 {
        let quota = (first * factor.powi(level as i32)).round() as usize;
        let quota = quota.min(budget - assigned);
        quotas.push(quota);
        assigned += quota;
    }
    quotas.push(budget - assigned);
    quotas
}

/// Orientation of the intensity centroid inside a radius-15 disc, in radians.
fn intensity_centroid_angle(image: ImageView<'_, u8>, x: usize, y: usize) -> f32 {
    let mut m01 = 0.0f32;
    let mut m10 = 0.0f32;
    let r2 = ORIENTATION_RADIUS * ORIENTATION_RADIUS;
    for dy in -ORIENTATION_RADIUS..=ORIENTATION_RADIUS {
        for dx in -ORIENTATION_RADIUS..=ORIENTATION_RADIUS {
            if dx * dx + dy * dy > r2 {
                continue;
            }
            let v = f32::from(image.at_clamped(x as isize + dx, y as isize + dy));
            m10 += dx as f32 * v;
            m01 += dy as f32 * v;
        }
    }
    m01.atan2(m10)
}

fn generate_pattern(seed: u64) -> Vec<TestPair> {
    let mut rng = StdRng::seed_from_u64(seed);
    let coord = |rng: &mut StdRng| {
        (
            rng.random_range(-PATTERN_HALF_EXTENT..=PATTERN_HALF_EXTENT),
            rng.random_range(-PATTERN_HALF_EXTENT..=PATTERN_HALF_EXTENT),
        )
    };
    let mut pattern = Vec::with_capacity(DESCRIPTOR_BYTES * 8);
    while pattern.len() < DESCRIPTOR_BYTES * 8 {
        let a = coord(&mut rng);
        let b = coord(&mut rng);
        if a != b {
            pattern.push(TestPair { a, b });
        }
    }
    pattern
}

#[cfg(test)]
mod tests {
    use super::{level_quotas, OrbConfig, OrbExtractor};
    use crate::features::KeypointExtractor;
    use crate::image::GrayImage;
    use crate::util::DocAlignError;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn blocks(width: usize, height: usize, block: usize, seed: u64) -> GrayImage {
        let mut rng = StdRng::seed_from_u64(seed);
        let bw = width.div_ceil(block);
        let bh = height.div_ceil(block);
        let values: Vec<u8> = (0..bw * bh).map(|_| rng.random_range(0..=255u8)).collect();
        let mut data = vec![0u8; width * height];
        for y in 0..height {
            for x in 0..width {
                data[y * width + x] = values[(y / block) * bw + x / block];
            }
        }
        GrayImage::new(data, width, height).unwrap()
    }

    #[test]
    fn quotas_sum_to_budget() {
        for budget in [0usize, 1, 7, 500, 1501] {
            for levels in 1..=6 {
                let q = level_quotas(budget, levels);
                assert_eq!(q.len(), levels);
                assert_eq!(q.iter().sum::<usize>(), budget);
            }
        }
        let q = level_quotas(500, 4);
        assert!(q[0] > q[1] && q[1] > q[2]);
    }

    #[test]
    fn blank_image_yields_no_keypoints() {
        let img = GrayImage::filled(210, 297, 200).unwrap();
        let kps = OrbExtractor::default().extract(img.view(), 500).unwrap();
        assert!(kps.is_empty());
    }

    #[test]
    fn textured_image_respects_budget() {
        let img = blocks(240, 200, 10, 3);
        let orb = OrbExtractor::default();
        let kps = orb.extract(img.view(), 60).unwrap();
        assert!(!kps.is_empty());
        assert!(kps.len() <= 60);
        for pair in kps.windows(2) {
            assert!(pair[0].response >= pair[1].response);
        }
        for kp in &kps {
            assert!(kp.x >= 0.0 && kp.x < 240.0);
            assert!(kp.y >= 0.0 && kp.y < 200.0);
        }
    }

    #[test]
    fn extraction_is_deterministic() {
        let img = blocks(160, 160, 8, 11);
        let a = OrbExtractor::default().extract(img.view(), 100).unwrap();
        let b = OrbExtractor::default().extract(img.view(), 100).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_budget_returns_empty() {
        let img = blocks(120, 120, 8, 5);
        let kps = OrbExtractor::default().extract(img.view(), 0).unwrap();
        assert!(kps.is_empty());
    }

    #[test]
    fn config_rejects_zero_levels() {
        let err = OrbExtractor::new(OrbConfig {
            n_levels: 0,
            ..OrbConfig::default()
        })
        .unwrap_err();
        assert_eq!(err, DocAlignError::InvalidConfig("n_levels must be >= 1"));
    }
}
