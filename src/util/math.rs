//! Small geometric helpers shared by estimation and drawing code.

/// Twice the signed area of the triangle `(a, b, c)`.
pub(crate) fn twice_signed_area(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

/// Returns true when any three of the four points are (nearly) collinear.
///
/// `min_area` is compared against twice the triangle area, so it has units
/// of squared pixels.
pub(crate) fn has_collinear_triple(pts: &[[f64; 2]; 4], min_area: f64) -> bool {
    const TRIPLES: [(usize, usize, usize); 4] = [(0, 1, 2), (0, 1, 3), (0, 2, 3), (1, 2, 3)];
    TRIPLES
        .iter()
        .any(|&(i, j, k)| twice_signed_area(pts[i], pts[j], pts[k]).abs() <= min_area)
}

/// Euclidean distance between two points.
pub(crate) fn distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    (dx * dx + dy * dy).sqrt()
}
