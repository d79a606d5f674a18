//! Planar projective transforms and their robust estimation.

pub mod dlt;
pub mod ransac;

pub use dlt::fit_dlt;
pub use ransac::{HomographyFit, RansacConfig, RansacHomography, RobustHomographyFitter};

use crate::util::{DocAlignError, DocAlignResult};
use nalgebra::{Matrix3, Vector3};

const EPS: f64 = 1e-12;

/// 3x3 projective transform mapping image coordinates to template coordinates.
///
/// Stored normalized so that `h[2][2] == 1` whenever that entry is non-zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    m: Matrix3<f64>,
}

impl Homography {
    /// The identity transform.
    pub fn identity() -> Self {
        Self {
            m: Matrix3::identity(),
        }
    }

    /// A pure translation by `(tx, ty)`.
    pub fn translation(tx: f64, ty: f64) -> Self {
        Self::from_rows([[1.0, 0.0, tx], [0.0, 1.0, ty], [0.0, 0.0, 1.0]])
    }

    /// Wraps a matrix, rescaling it so the bottom-right entry is 1.
    pub fn from_matrix(m: Matrix3<f64>) -> Self {
        let w = m[(2, 2)];
        if w.is_finite() && w.abs() > EPS {
            Self { m: m / w }
        } else {
            Self { m }
        }
    }

    /// Builds a homography from row-major entries.
    pub fn from_rows(rows: [[f64; 3]; 3]) -> Self {
        Self::from_matrix(Matrix3::new(
            rows[0][0], rows[0][1], rows[0][2], rows[1][0], rows[1][1], rows[1][2], rows[2][0],
            rows[2][1], rows[2][2],
        ))
    }

    /// Returns the underlying matrix.
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.m
    }

    /// Returns the row-major entries.
    pub fn to_rows(&self) -> [[f64; 3]; 3] {
        let m = &self.m;
        [
            [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
            [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
            [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
        ]
    }

    /// Maps a point; returns `None` when it lands on the line at infinity.
    pub fn apply(&self, p: [f64; 2]) -> Option<[f64; 2]> {
        let v = self.m * Vector3::new(p[0], p[1], 1.0);
        let w = v[2];
        if !w.is_finite() || w.abs() <= EPS {
            return None;
        }
        let x = v[0] / w;
        let y = v[1] / w;
        (x.is_finite() && y.is_finite()).then_some([x, y])
    }

    /// Returns true when every entry is finite.
    pub fn is_finite(&self) -> bool {
        self.m.iter().all(|v| v.is_finite())
    }

    /// Inverts the transform.
    ///
    /// Fails with [`DocAlignError::SingularTransform`] when the matrix is not
    /// finite or its determinant is negligible relative to its entries.
    pub fn inverse(&self) -> DocAlignResult<Homography> {
        if !self.is_finite() {
            return Err(DocAlignError::SingularTransform);
        }
        let scale = self.m.amax();
        let det = self.m.determinant();
        if scale <= EPS || !det.is_finite() || det.abs() <= EPS * scale * scale * scale {
            return Err(DocAlignError::SingularTransform);
        }
        self.m
            .try_inverse()
            .map(Homography::from_matrix)
            .ok_or(DocAlignError::SingularTransform)
    }

    /// Largest absolute entry-wise difference to another homography.
    pub fn max_abs_diff(&self, other: &Homography) -> f64 {
        (self.m - other.m).amax()
    }
}
