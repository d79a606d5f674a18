//! Perspective rectification of the input image into the template frame.

use crate::geometry::Homography;
use crate::image::Image;
use crate::util::DocAlignResult;

/// Resamples `src` through `h` (image to template coordinates).
///
/// The output has the same width, height and channel count as `src`. Each
/// destination pixel `(x, y)` is read from `h⁻¹(x, y)` in the source with
/// bilinear interpolation per channel, rounded to the nearest integer.
/// Destination pixels whose source coordinate falls outside the image are
/// set to `fill` in every channel.
///
/// Fails with [`crate::DocAlignError::SingularTransform`] when `h` cannot be
/// inverted.
pub fn warp_perspective(src: &Image, h: &Homography, fill: u8) -> DocAlignResult<Image> {
    let inverse = h.inverse()?;
    let width = src.width();
    let height = src.height();
    let channels = src.channels();
    let max_x = width as f64 - 1.0;
    let max_y = height as f64 - 1.0;
    let row_len = width * channels;
    let data = src.data();

    let mut out = vec![fill; row_len * height];
    for y in 0..height {
        for x in 0..width {
            let Some([src_x, src_y]) = inverse.apply([x as f64, y as f64]) else {
                continue;
            };

            let epsilon = 1e-6;
            if src_x < -epsilon || src_y < -epsilon || src_x > max_x + epsilon || src_y > max_y + epsilon
            {
                continue;
            }

            let src_x = src_x.clamp(0.0, max_x);
            let src_y = src_y.clamp(0.0, max_y);
            let x0 = src_x.floor() as usize;
            let y0 = src_y.floor() as usize;
            let x1 = (x0 + 1).min(width - 1);
            let y1 = (y0 + 1).min(height - 1);
            let fx = src_x - x0 as f64;
            let fy = src_y - y0 as f64;

            let w00 = (1.0 - fx) * (1.0 - fy);
            let w10 = fx * (1.0 - fy);
            let w01 = (1.0 - fx) * fy;
            let w11 = fx * fy;

            let out_base = y * row_len + x * channels;
            for c in 0..channels {
                let a = f64::from(data[y0 * row_len + x0 * channels + c]);
                let b = f64::from(data[y0 * row_len + x1 * channels + c]);
                let d = f64::from(data[y1 * row_len + x0 * channels + c]);
                let e = f64::from(data[y1 * row_len + x1 * channels + c]);
                let value = a * w00 + b * w10 + d * w01 + e * w11;
                out[out_base + c] = value.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    Image::new(out, width, height, channels)
}
