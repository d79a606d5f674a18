//! FAST-9 segment-test corner detection with Harris ranking.
//!
//! A pixel is a corner when at least 9 contiguous pixels on the radius-3
//! Bresenham circle are all brighter than `center + threshold` or all darker
//! than `center - threshold`. Corners are scored with the Harris response
//! over a 7x7 window and thinned with 3x3 non-maximum suppression; on equal
//! responses the corner earlier in raster order survives.

use crate::image::ImageView;

/// Bresenham circle of radius 3, clockwise from the top.
const CIRCLE: [(isize, isize); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

const ARC_LEN: usize = 9;
const HARRIS_RADIUS: isize = 3;

/// Smallest border that keeps FAST and Harris sampling inside the image.
pub const MIN_BORDER: usize = 4;

/// Detected corner in the coordinates of the scanned image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Corner {
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
    /// Harris response.
    pub response: f32,
}

/// Runs the FAST-9 segment test at `(x, y)`.
///
/// The caller guarantees that the circle lies inside the image.
pub fn is_corner(image: ImageView<'_, u8>, x: usize, y: usize, threshold: u8) -> bool {
    let center = i16::from(image.at_clamped(x as isize, y as isize));
    let t = i16::from(threshold);

    // Cardinal points reject most pixels cheaply: a 9-arc always covers
    // at least two of them.
    let mut bright = 0;
    let mut dark = 0;
    for idx in [0usize, 4, 8, 12] {
        let (dx, dy) = CIRCLE[idx];
        let v = i16::from(image.at_clamped(x as isize + dx, y as isize + dy));
        if v > center + t {
            bright += 1;
        } else if v < center - t {
            dark += 1;
        }
    }
    if bright < 2 && dark < 2 {
        return false;
    }

    let mut states = [0i8; 16];
    for (state, &(dx, dy)) in states.iter_mut().zip(CIRCLE.iter()) {
        let v = i16::from(image.at_clamped(x as isize + dx, y as isize + dy));
        *state = if v > center + t {
            1
        } else if v < center - t {
            -1
        } else {
            0
        };
    }

    for target in [1i8, -1] {
        let mut run = 0usize;
        for i in 0..(CIRCLE.len() + ARC_LEN - 1) {
            if states[i % CIRCLE.len()] == target {
                run += 1;
                if run >= ARC_LEN {
                    return true;
                }
            } else {
                run = 0;
            }
        }
    }
    false
}

/// Computes the Harris corner response `det(M) - k * trace(M)^2` over a
/// 7x7 window of central-difference gradients.
pub fn harris_response(image: ImageView<'_, u8>, x: usize, y: usize, k: f32) -> f32 {
    let (mut sxx, mut syy, mut sxy) = (0.0f32, 0.0f32, 0.0f32);
    for dy in -HARRIS_RADIUS..=HARRIS_RADIUS {
        for dx in -HARRIS_RADIUS..=HARRIS_RADIUS {
            let px = x as isize + dx;
            let py = y as isize + dy;
            let gx = (f32::from(image.at_clamped(px + 1, py))
                - f32::from(image.at_clamped(px - 1, py)))
                * 0.5;
            let gy = (f32::from(image.at_clamped(px, py + 1))
                - f32::from(image.at_clamped(px, py - 1)))
                * 0.5;
            sxx += gx * gx;
            syy += gy * gy;
            sxy += gx * gy;
        }
    }
    let det = sxx * syy - sxy * sxy;
    let trace = sxx + syy;
    det - k * trace * trace
}

/// Detects FAST-9 corners at least `border` pixels away from every edge.
///
/// Returned corners are non-maximum suppressed and listed in raster order.
pub fn detect(image: ImageView<'_, u8>, threshold: u8, border: usize, harris_k: f32) -> Vec<Corner> {
    let border = border.max(MIN_BORDER);
    let width = image.width();
    let height = image.height();
    if width <= 2 * border || height <= 2 * border {
        return Vec::new();
    }

    let mut scores = vec![f32::NEG_INFINITY; width * height];
    let mut raw = Vec::new();
    for y in border..height - border {
        for x in border..width - border {
            if is_corner(image, x, y, threshold) {
                let response = harris_response(image, x, y, harris_k);
                scores[y * width + x] = response;
                raw.push(Corner { x, y, response });
            }
        }
    }

    raw.into_iter()
        .filter(|c| is_local_max(&scores, width, c))
        .collect()
}

fn is_local_max(scores: &[f32], width: usize, c: &Corner) -> bool {
    let own_idx = c.y * width + c.x;
    for ny in c.y - 1..=c.y + 1 {
        for nx in c.x - 1..=c.x + 1 {
            let idx = ny * width + nx;
            if idx == own_idx {
                continue;
            }
            let other = scores[idx];
            if other > c.response || (other == c.response && idx < own_idx) {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::{detect, harris_response, is_corner};
    use crate::image::GrayImage;

    fn square_image() -> GrayImage {
        // Bright 10x10 square on a dark 32x32 background.
        let mut data = vec![20u8; 32 * 32];
        for y in 11..21 {
            for x in 11..21 {
                data[y * 32 + x] = 220;
            }
        }
        GrayImage::new(data, 32, 32).unwrap()
    }

    #[test]
    fn flat_image_has_no_corners() {
        let img = GrayImage::filled(40, 40, 128).unwrap();
        assert!(detect(img.view(), 20, 4, 0.04).is_empty());
    }

    #[test]
    fn square_corner_passes_segment_test() {
        let img = square_image();
        assert!(is_corner(img.view(), 11, 11, 20));
        // Middle of an edge is not a corner.
        assert!(!is_corner(img.view(), 15, 11, 20));
        // Interior of the square is flat.
        assert!(!is_corner(img.view(), 15, 15, 20));
    }

    #[test]
    fn detect_finds_the_four_square_corners() {
        let img = square_image();
        let corners = detect(img.view(), 20, 4, 0.04);
        assert!(corners.len() >= 4);
        for (cx, cy) in [(11usize, 11usize), (20, 11), (11, 20), (20, 20)] {
            assert!(
                corners
                    .iter()
                    .any(|c| c.x.abs_diff(cx) <= 1 && c.y.abs_diff(cy) <= 1),
                "missing corner near ({cx}, {cy})"
            );
        }
    }

    #[test]
    fn harris_prefers_corners_to_edges() {
        let img = square_image();
        let corner = harris_response(img.view(), 11, 11, 0.04);
        let edge = harris_response(img.view(), 15, 11, 0.04);
        assert!(corner > edge);
        assert!(corner > 0.0);
    }
}
