//! Document-to-template alignment pipeline.
//!
//! Both inputs are reduced to intensity, described with keypoints, matched
//! by descriptor distance and filtered down to the strongest pairs. The
//! match diagnostic is rendered from whatever survived filtering. With at
//! least four pairs a homography is fitted and the input is rectified into
//! the template frame.
//!
//! Matching and geometry failures are reported in [`ScanOutcome::error`];
//! only malformed inputs, bad configuration and extractor faults surface as
//! `Err`.

mod outcome;

pub use outcome::ScanOutcome;

use crate::features::{Keypoint, KeypointExtractor, OrbExtractor};
use crate::geometry::{RansacHomography, RobustHomographyFitter};
use crate::image::gray::to_gray;
use crate::image::{GrayImage, Image};
use crate::matching::{self, Correspondence};
use crate::rectify::warp_perspective;
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{DocAlignError, DocAlignResult};
use crate::visualize::draw_matches;

/// Pipeline parameters.
#[derive(Clone, Debug)]
pub struct ScanConfig {
    /// Maximum keypoints extracted from each input.
    pub feature_budget: usize,
    /// Percentage (0 to 100) of candidate correspondences kept.
    pub retain_fraction: f64,
    /// Run extraction and matching on the rayon pool (needs the `rayon` feature).
    pub parallel: bool,
    /// Value written to rectified pixels that map outside the input.
    pub fill_value: u8,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            feature_budget: 500,
            retain_fraction: 5.0,
            parallel: false,
            fill_value: 0,
        }
    }
}

impl ScanConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> DocAlignResult<()> {
        if self.feature_budget == 0 {
            return Err(DocAlignError::InvalidConfig("feature_budget must be >= 1"));
        }
        matching::retained_count(0, self.retain_fraction)?;
        Ok(())
    }
}

/// Aligns photographed documents to a reference template.
///
/// Keypoint extraction and homography fitting are pluggable; the defaults
/// are [`OrbExtractor`] and [`RansacHomography`].
#[derive(Clone, Debug)]
pub struct Scanner<E = OrbExtractor, F = RansacHomography> {
    cfg: ScanConfig,
    extractor: E,
    fitter: F,
}

impl Scanner {
    /// Creates a scanner with the built-in extractor and fitter.
    pub fn new(cfg: ScanConfig) -> DocAlignResult<Self> {
        Self::with_parts(cfg, OrbExtractor::default(), RansacHomography::default())
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self {
            cfg: ScanConfig::default(),
            extractor: OrbExtractor::default(),
            fitter: RansacHomography::default(),
        }
    }
}

impl<E, F> Scanner<E, F>
where
    E: KeypointExtractor,
    F: RobustHomographyFitter,
{
    /// Creates a scanner from explicit components.
    pub fn with_parts(cfg: ScanConfig, extractor: E, fitter: F) -> DocAlignResult<Self> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            extractor,
            fitter,
        })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &ScanConfig {
        &self.cfg
    }

    /// Returns the keypoint extractor.
    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// Returns the homography fitter.
    pub fn fitter(&self) -> &F {
        &self.fitter
    }

    /// Aligns `image` to `template`.
    ///
    /// Returns `Err` for unsupported channel layouts and extractor faults.
    /// Every other failure is carried by the returned [`ScanOutcome`]
    /// together with the match visualization.
    pub fn scan(&self, image: &Image, template: &Image) -> DocAlignResult<ScanOutcome> {
        let _span = trace_span!(
            "scan",
            image_w = image.width(),
            image_h = image.height(),
            template_w = template.width(),
            template_h = template.height()
        )
        .entered();

        let image_gray = to_gray(image)?;
        let template_gray = to_gray(template)?;
        let (image_kps, template_kps) = self.extract_pair(&image_gray, &template_gray)?;
        drop(image_gray);
        drop(template_gray);
        trace_event!(
            "keypoints",
            image = image_kps.len(),
            template = template_kps.len()
        );

        let candidates = self.match_keypoints(&template_kps, &image_kps);
        let candidate_count = candidates.len();
        let retained = matching::retain_best(candidates, self.cfg.retain_fraction)?;
        trace_event!(
            "correspondences",
            candidates = candidate_count,
            retained = retained.len()
        );

        let visualization = draw_matches(image, &image_kps, template, &template_kps, &retained)?;

        let mut outcome = ScanOutcome {
            rectified: None,
            visualization,
            homography: None,
            image_keypoints: image_kps.len(),
            template_keypoints: template_kps.len(),
            candidates: candidate_count,
            correspondences: Vec::new(),
            inliers: 0,
            error: None,
        };

        if let Err(err) = matching::require_minimum(&retained) {
            outcome.correspondences = retained;
            return Ok(fail(outcome, err));
        }

        let (src, dst) = point_sets(&retained, &image_kps, &template_kps);
        outcome.correspondences = retained;
        let fit = match self.fitter.fit(&src, &dst) {
            Ok(fit) => fit,
            Err(err) => return Ok(fail(outcome, err)),
        };
        outcome.inliers = fit.inlier_count();
        outcome.homography = Some(fit.homography);
        trace_event!(
            "homography",
            inliers = outcome.inliers,
            iterations = fit.iterations
        );

        match warp_perspective(image, &fit.homography, self.cfg.fill_value) {
            Ok(rectified) => outcome.rectified = Some(rectified),
            Err(err) => return Ok(fail(outcome, err)),
        }
        Ok(outcome)
    }

    fn extract_pair(
        &self,
        image: &GrayImage,
        template: &GrayImage,
    ) -> DocAlignResult<(Vec<Keypoint>, Vec<Keypoint>)> {
        let extractor = &self.extractor;
        let budget = self.cfg.feature_budget;

        #[cfg(feature = "rayon")]
        {
            if self.cfg.parallel {
                let (image_kps, template_kps) = rayon::join(
                    || extract_keypoints(extractor, "image", image, budget),
                    || extract_keypoints(extractor, "template", template, budget),
                );
                return Ok((image_kps?, template_kps?));
            }
        }

        Ok((
            extract_keypoints(extractor, "image", image, budget)?,
            extract_keypoints(extractor, "template", template, budget)?,
        ))
    }

    fn match_keypoints(&self, template: &[Keypoint], image: &[Keypoint]) -> Vec<Correspondence> {
        #[cfg(feature = "rayon")]
        {
            if self.cfg.parallel {
                return matching::match_descriptors_par(template, image);
            }
        }
        matching::match_descriptors(template, image)
    }
}

fn extract_keypoints<E: KeypointExtractor>(
    extractor: &E,
    role: &'static str,
    gray: &GrayImage,
    budget: usize,
) -> DocAlignResult<Vec<Keypoint>> {
    let mut keypoints =
        extractor
            .extract(gray.view(), budget)
            .map_err(|err| DocAlignError::Extraction {
                role,
                width: gray.width(),
                height: gray.height(),
                reason: err.to_string(),
            })?;
    keypoints.truncate(budget);
    Ok(keypoints)
}

/// Image-space and template-space locations of each retained pair.
fn point_sets(
    retained: &[Correspondence],
    image_kps: &[Keypoint],
    template_kps: &[Keypoint],
) -> (Vec<[f64; 2]>, Vec<[f64; 2]>) {
    retained
        .iter()
        .map(|c| {
            (
                image_kps[c.image_idx].point(),
                template_kps[c.template_idx].point(),
            )
        })
        .unzip()
}

fn fail(mut outcome: ScanOutcome, err: DocAlignError) -> ScanOutcome {
    let message = err.to_string();
    trace_warn!(
        "scan_failed",
        error = message.as_str(),
        recoverable = err.is_recoverable()
    );
    outcome.error = Some(err);
    outcome
}

/// Aligns `image` to `template` with the built-in components.
///
/// Returns `(rectified, visualization, error message)`. Only malformed
/// inputs, out-of-range parameters and extractor faults are `Err`.
pub fn scan(
    image: &Image,
    template: &Image,
    feature_budget: usize,
    retain_fraction: f64,
) -> DocAlignResult<(Option<Image>, Image, Option<String>)> {
    let cfg = ScanConfig {
        feature_budget,
        retain_fraction,
        ..ScanConfig::default()
    };
    Ok(Scanner::new(cfg)?.scan(image, template)?.into_parts())
}

#[cfg(test)]
mod tests {
    use super::{ScanConfig, Scanner};
    use crate::features::{Keypoint, KeypointExtractor};
    use crate::geometry::{Homography, HomographyFit, RobustHomographyFitter};
    use crate::image::{Image, ImageView};
    use crate::matching::tests::keypoint_with;
    use crate::util::{DocAlignError, DocAlignResult};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns `count` keypoints whose descriptors pair up one to one across
    /// inputs, at positions offset by the image width.
    struct GridExtractor {
        count: usize,
    }

    impl KeypointExtractor for GridExtractor {
        fn extract(&self, image: ImageView<'_, u8>, _budget: usize) -> DocAlignResult<Vec<Keypoint>> {
            let shift = image.width() as f32 / 10.0;
            Ok((0..self.count)
                .map(|i| {
                    let x = (i % 4) as f32 * 10.0 + shift;
                    let y = (i / 4) as f32 * 10.0 + (i % 3) as f32;
                    keypoint_with(&[i * 3], x, y)
                })
                .collect())
        }
    }

    struct FailingExtractor;

    impl KeypointExtractor for FailingExtractor {
        fn extract(&self, _image: ImageView<'_, u8>, _budget: usize) -> DocAlignResult<Vec<Keypoint>> {
            Err(DocAlignError::InvalidConfig("boom"))
        }
    }

    struct FixedFitter {
        result: DocAlignResult<Homography>,
        calls: AtomicUsize,
    }

    impl FixedFitter {
        fn new(result: DocAlignResult<Homography>) -> Self {
            Self {
                result,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl RobustHomographyFitter for FixedFitter {
        fn fit(&self, src: &[[f64; 2]], dst: &[[f64; 2]]) -> DocAlignResult<HomographyFit> {
            assert_eq!(src.len(), dst.len());
            self.calls.fetch_add(1, Ordering::SeqCst);
            let homography = self.result.clone()?;
            Ok(HomographyFit {
                homography,
                inliers: vec![true; src.len()],
                iterations: 1,
            })
        }
    }

    fn all_matches() -> ScanConfig {
        ScanConfig {
            retain_fraction: 100.0,
            ..ScanConfig::default()
        }
    }

    fn gray(width: usize, height: usize) -> Image {
        let data = (0..width * height).map(|i| (i % 251) as u8).collect();
        Image::new(data, width, height, 1).unwrap()
    }

    #[test]
    fn success_with_identity_fit() {
        let fitter = FixedFitter::new(Ok(Homography::identity()));
        let scanner = Scanner::with_parts(all_matches(), GridExtractor { count: 8 }, &fitter).unwrap();
        let image = gray(40, 30);
        let template = gray(20, 30);
        let outcome = scanner.scan(&image, &template).unwrap();

        assert!(outcome.is_success());
        assert_eq!(outcome.rectified.as_ref(), Some(&image));
        assert_eq!(outcome.correspondences.len(), 8);
        assert_eq!(outcome.inliers, 8);
        assert_eq!(outcome.visualization.width(), 60);
        assert_eq!(fitter.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn fewer_than_four_pairs_skips_the_fitter() {
        let fitter = FixedFitter::new(Ok(Homography::identity()));
        let scanner = Scanner::with_parts(all_matches(), GridExtractor { count: 3 }, &fitter).unwrap();
        let outcome = scanner.scan(&gray(30, 30), &gray(30, 30)).unwrap();

        assert_eq!(fitter.calls.load(Ordering::SeqCst), 0);
        assert!(outcome.rectified.is_none());
        assert!(outcome.homography.is_none());
        assert_eq!(outcome.correspondences.len(), 3);
        assert_eq!(
            outcome.error,
            Some(DocAlignError::InsufficientCorrespondences { retained: 3 })
        );
        assert_eq!(outcome.error_message().as_deref(), Some("Found less than 4 matches"));
        assert_eq!(outcome.visualization.width(), 60);
    }

    #[test]
    fn degenerate_fit_is_reported_in_the_outcome() {
        let err = DocAlignError::DegenerateGeometry {
            reason: "every sample was collinear or ill-conditioned",
        };
        let fitter = FixedFitter::new(Err(err.clone()));
        let scanner = Scanner::with_parts(all_matches(), GridExtractor { count: 12 }, &fitter).unwrap();
        let (rectified, visualization, message) =
            scanner.scan(&gray(30, 20), &gray(30, 20)).unwrap().into_parts();

        assert!(rectified.is_none());
        assert_eq!(visualization.height(), 20);
        let message = message.unwrap();
        assert!(message.starts_with("Degenerate match geometry"));
        assert_ne!(message, "Found less than 4 matches");
    }

    #[test]
    fn singular_fit_is_caught_before_rectification() {
        let fitter = FixedFitter::new(Ok(Homography::from_rows([[0.0; 3]; 3])));
        let scanner = Scanner::with_parts(all_matches(), GridExtractor { count: 6 }, &fitter).unwrap();
        let outcome = scanner.scan(&gray(30, 20), &gray(30, 20)).unwrap();

        assert!(outcome.rectified.is_none());
        assert!(outcome.homography.is_some());
        assert_eq!(outcome.error, Some(DocAlignError::SingularTransform));
    }

    #[test]
    fn zero_retain_fraction_always_fails_the_gate() {
        let fitter = FixedFitter::new(Ok(Homography::identity()));
        let cfg = ScanConfig {
            retain_fraction: 0.0,
            ..ScanConfig::default()
        };
        let scanner = Scanner::with_parts(cfg, GridExtractor { count: 40 }, &fitter).unwrap();
        let outcome = scanner.scan(&gray(30, 20), &gray(30, 20)).unwrap();

        assert_eq!(outcome.candidates, 40);
        assert!(outcome.correspondences.is_empty());
        assert_eq!(
            outcome.error,
            Some(DocAlignError::InsufficientCorrespondences { retained: 0 })
        );
        assert_eq!(fitter.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn extractor_faults_carry_context() {
        let fitter = FixedFitter::new(Ok(Homography::identity()));
        let scanner = Scanner::with_parts(all_matches(), FailingExtractor, &fitter).unwrap();
        let err = scanner.scan(&gray(12, 9), &gray(5, 5)).unwrap_err();
        match err {
            DocAlignError::Extraction {
                role,
                width,
                height,
                reason,
            } => {
                assert_eq!(role, "image");
                assert_eq!((width, height), (12, 9));
                assert!(reason.contains("boom"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unsupported_channel_count_is_an_error() {
        let fitter = FixedFitter::new(Ok(Homography::identity()));
        let scanner = Scanner::with_parts(all_matches(), GridExtractor { count: 6 }, &fitter).unwrap();
        let two_channel = Image::filled(4, 4, &[1, 2]).unwrap();
        let err = scanner.scan(&two_channel, &gray(4, 4)).unwrap_err();
        assert!(matches!(err, DocAlignError::InvalidImage { .. }));
    }

    #[test]
    fn config_validation() {
        assert!(ScanConfig::default().validate().is_ok());
        let zero_budget = ScanConfig {
            feature_budget: 0,
            ..ScanConfig::default()
        };
        assert!(Scanner::new(zero_budget).is_err());
        let bad_fraction = ScanConfig {
            retain_fraction: 150.0,
            ..ScanConfig::default()
        };
        assert!(bad_fraction.validate().is_err());
    }
}
