//! Random-sample consensus over minimal four-point samples.
//!
//! Each iteration draws four distinct pairs from a seeded generator, rejects
//! samples with three collinear points on either side, fits an exact
//! homography and counts pairs whose forward reprojection error is within
//! the threshold. A model replaces the current best only with strictly more
//! inliers, so ties keep the earliest model. The iteration bound shrinks
//! adaptively with the observed inlier ratio.

use crate::geometry::{fit_dlt, Homography};
use crate::trace::trace_event;
use crate::util::math::{distance, has_collinear_triple};
use crate::util::{DocAlignError, DocAlignResult};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

/// Samples whose triangle area (doubled, in squared pixels) falls below this
/// are treated as collinear.
const COLLINEAR_AREA: f64 = 1e-2;

/// Configuration for [`RansacHomography`].
#[derive(Clone, Debug)]
pub struct RansacConfig {
    /// Maximum forward reprojection error, in template pixels, for an inlier.
    pub reprojection_threshold: f64,
    /// Upper bound on sampling iterations.
    pub max_iterations: usize,
    /// Desired probability of drawing at least one all-inlier sample.
    pub confidence: f64,
    /// Fewest inliers for a model to be accepted (at least 4).
    pub min_inliers: usize,
    /// Seed for sample selection.
    pub seed: u64,
    /// Refit the best model by least squares over its inliers.
    pub refine: bool,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            reprojection_threshold: 3.0,
            max_iterations: 2000,
            confidence: 0.995,
            min_inliers: 4,
            seed: 0x5eed_d0c5,
            refine: true,
        }
    }
}

impl RansacConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> DocAlignResult<()> {
        if !self.reprojection_threshold.is_finite() || self.reprojection_threshold <= 0.0 {
            return Err(DocAlignError::InvalidConfig(
                "reprojection_threshold must be finite and > 0",
            ));
        }
        if self.max_iterations == 0 {
            return Err(DocAlignError::InvalidConfig("max_iterations must be >= 1"));
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(DocAlignError::InvalidConfig(
                "confidence must be within (0, 1)",
            ));
        }
        if self.min_inliers < 4 {
            return Err(DocAlignError::InvalidConfig("min_inliers must be >= 4"));
        }
        Ok(())
    }
}

/// Result of a robust homography fit.
#[derive(Clone, Debug, PartialEq)]
pub struct HomographyFit {
    /// Transform mapping source points onto destination points.
    pub homography: Homography,
    /// Inlier flag per input pair.
    pub inliers: Vec<bool>,
    /// Sampling iterations performed.
    pub iterations: usize,
}

impl HomographyFit {
    /// Number of inlier pairs.
    pub fn inlier_count(&self) -> usize {
        self.inliers.iter().filter(|&&inlier| inlier).count()
    }
}

/// Estimates a homography from noisy point pairs.
///
/// Implementations map `src[i]` onto `dst[i]` and fail with
/// [`DocAlignError::DegenerateGeometry`] when no consistent model exists.
pub trait RobustHomographyFitter {
    /// Fits a transform taking `src` points onto `dst` points.
    fn fit(&self, src: &[[f64; 2]], dst: &[[f64; 2]]) -> DocAlignResult<HomographyFit>;
}

impl<F: RobustHomographyFitter + ?Sized> RobustHomographyFitter for &F {
    fn fit(&self, src: &[[f64; 2]], dst: &[[f64; 2]]) -> DocAlignResult<HomographyFit> {
        (**self).fit(src, dst)
    }
}

/// Built-in seeded RANSAC homography estimator.
#[derive(Clone, Debug, Default)]
pub struct RansacHomography {
    cfg: RansacConfig,
}

impl RansacHomography {
    /// Creates an estimator after validating `cfg`.
    pub fn new(cfg: RansacConfig) -> DocAlignResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &RansacConfig {
        &self.cfg
    }

    fn score(&self, h: &Homography, src: &[[f64; 2]], dst: &[[f64; 2]]) -> (usize, Vec<bool>) {
        let mask: Vec<bool> = src
            .iter()
            .zip(dst)
            .map(|(&s, &d)| {
                h.apply(s)
                    .is_some_and(|p| distance(p, d) <= self.cfg.reprojection_threshold)
            })
            .collect();
        let count = mask.iter().filter(|&&m| m).count();
        (count, mask)
    }

    fn required_iterations(&self, inliers: usize, total: usize) -> usize {
        let w = inliers as f64 / total as f64;
        let p_good = w.powi(4);
        if p_good >= 1.0 {
            return 0;
        }
        if p_good <= 0.0 {
            return self.cfg.max_iterations;
        }
        let k = (1.0 - self.cfg.confidence).ln() / (1.0 - p_good).ln();
        if k.is_finite() {
            (k.ceil() as usize).min(self.cfg.max_iterations)
        } else {
            self.cfg.max_iterations
        }
    }

    fn refit(
        &self,
        best: (Homography, usize, Vec<bool>),
        src: &[[f64; 2]],
        dst: &[[f64; 2]],
    ) -> (Homography, usize, Vec<bool>) {
        let (inlier_src, inlier_dst): (Vec<[f64; 2]>, Vec<[f64; 2]>) = src
            .iter()
            .zip(dst)
            .zip(&best.2)
            .filter(|(_, &keep)| keep)
            .map(|((&s, &d), _)| (s, d))
            .unzip();
        let Some(refined) = fit_dlt(&inlier_src, &inlier_dst) else {
            return best;
        };
        let (count, mask) = self.score(&refined, src, dst);
        if count >= best.1 {
            (refined, count, mask)
        } else {
            best
        }
    }
}

impl RobustHomographyFitter for RansacHomography {
    fn fit(&self, src: &[[f64; 2]], dst: &[[f64; 2]]) -> DocAlignResult<HomographyFit> {
        if src.len() != dst.len() {
            return Err(DocAlignError::DegenerateGeometry {
                reason: "point sets differ in length",
            });
        }
        let n = src.len();
        if n < 4 {
            return Err(DocAlignError::DegenerateGeometry {
                reason: "fewer than 4 point pairs",
            });
        }

        let mut rng = StdRng::seed_from_u64(self.cfg.seed);
        let mut best: Option<(Homography, usize, Vec<bool>)> = None;
        let mut limit = self.cfg.max_iterations;
        let mut iterations = 0usize;

        while iterations < limit {
            iterations += 1;
            let sample = index::sample(&mut rng, n, 4);
            let mut s = [[0.0; 2]; 4];
            let mut d = [[0.0; 2]; 4];
            for (slot, idx) in sample.iter().enumerate() {
                s[slot] = src[idx];
                d[slot] = dst[idx];
            }
            if has_collinear_triple(&s, COLLINEAR_AREA) || has_collinear_triple(&d, COLLINEAR_AREA)
            {
                continue;
            }
            let Some(model) = fit_dlt(&s, &d) else {
                continue;
            };
            let (count, mask) = self.score(&model, src, dst);
            if best.as_ref().map_or(true, |b| count > b.1) {
                limit = limit.min(self.required_iterations(count, n).max(iterations));
                best = Some((model, count, mask));
            }
        }

        let Some(mut best) = best else {
            return Err(DocAlignError::DegenerateGeometry {
                reason: "every sample was collinear or ill-conditioned",
            });
        };
        if best.1 < self.cfg.min_inliers {
            return Err(DocAlignError::DegenerateGeometry {
                reason: "no model reached the minimum inlier count",
            });
        }
        if self.cfg.refine && best.1 > 4 {
            best = self.refit(best, src, dst);
        }

        let (homography, count, inliers) = best;
        if homography.inverse().is_err() {
            return Err(DocAlignError::DegenerateGeometry {
                reason: "estimated transform is singular",
            });
        }
        trace_event!("ransac_fit", inliers = count, iterations = iterations);
        Ok(HomographyFit {
            homography,
            inliers,
            iterations,
        })
    }
}
