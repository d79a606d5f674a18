//! Normalized direct linear transform.
//!
//! Both point sets are translated to their centroid and scaled to a mean
//! distance of `sqrt(2)` before the linear system is built. The solution is
//! the eigenvector of `AᵀA` with the smallest eigenvalue, mapped back through
//! the normalizing transforms.

use crate::geometry::Homography;
use nalgebra::{Matrix3, SMatrix, SVector};

type Mat9 = SMatrix<f64, 9, 9>;
type Vec9 = SVector<f64, 9>;

/// Similarity that centers `points` and scales them to mean radius `sqrt(2)`.
///
/// Returns the forward transform and its inverse, or `None` when every point
/// coincides.
fn normalizer(points: &[[f64; 2]]) -> Option<(Matrix3<f64>, Matrix3<f64>)> {
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(ax, ay), p| (ax + p[0], ay + p[1]));
    let (cx, cy) = (sx / n, sy / n);
    let mean_dist = points
        .iter()
        .map(|p| ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    if !mean_dist.is_finite() || mean_dist <= 1e-12 {
        return None;
    }
    let s = std::f64::consts::SQRT_2 / mean_dist;
    let forward = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let inverse = Matrix3::new(1.0 / s, 0.0, cx, 0.0, 1.0 / s, cy, 0.0, 0.0, 1.0);
    Some((forward, inverse))
}

fn normalize(t: &Matrix3<f64>, p: [f64; 2]) -> (f64, f64) {
    (
        t[(0, 0)] * p[0] + t[(0, 2)],
        t[(1, 1)] * p[1] + t[(1, 2)],
    )
}

/// Fits a homography mapping `src[i]` to `dst[i]` in the least-squares sense.
///
/// Needs at least four pairs of equal-length slices. Returns `None` when the
/// input is too small or the solution is not a finite transform.
pub fn fit_dlt(src: &[[f64; 2]], dst: &[[f64; 2]]) -> Option<Homography> {
    if src.len() < 4 || src.len() != dst.len() {
        return None;
    }
    let (t_src, _) = normalizer(src)?;
    let (t_dst, t_dst_inv) = normalizer(dst)?;

    let mut ata = Mat9::zeros();
    for (s, d) in src.iter().zip(dst) {
        let (x, y) = normalize(&t_src, *s);
        let (u, v) = normalize(&t_dst, *d);
        let r1 = Vec9::from_column_slice(&[-x, -y, -1.0, 0.0, 0.0, 0.0, u * x, u * y, u]);
        let r2 = Vec9::from_column_slice(&[0.0, 0.0, 0.0, -x, -y, -1.0, v * x, v * y, v]);
        ata += r1 * r1.transpose();
        ata += r2 * r2.transpose();
    }

    let eig = ata.symmetric_eigen();
    let smallest = eig.eigenvalues.imin();
    let h = eig.eigenvectors.column(smallest);
    let normalized = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]);

    let m = t_dst_inv * normalized * t_src;
    if m[(2, 2)].abs() <= 1e-12 {
        return None;
    }
    let homography = Homography::from_matrix(m);
    homography.is_finite().then_some(homography)
}
