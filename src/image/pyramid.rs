//! Image pyramid construction and smoothing for grayscale `u8` images.
//!
//! Downsampling uses a 2x2 box filter with integer rounding:
//! `dst = ((a + b + c + d) + 2) / 4`. Pixel `(x, y)` at level `l` therefore
//! covers the level-0 block whose center is `((x + 0.5) * 2^l - 0.5, ...)`.

use crate::image::{GrayImage, ImageView};
use crate::util::DocAlignResult;

/// Owned image pyramid built from a base level.
pub struct ImagePyramid {
    levels: Vec<GrayImage>,
}

impl ImagePyramid {
    /// Builds a pyramid from a base grayscale view.
    ///
    /// `max_levels` is clamped to at least 1 so the base level is always
    /// present. Halving stops once a level would drop below `min_size` pixels
    /// on either side.
    pub fn build(base: ImageView<'_, u8>, max_levels: usize, min_size: usize) -> DocAlignResult<Self> {
        let max_levels = max_levels.max(1);
        let mut levels = Vec::with_capacity(max_levels);
        levels.push(copy_view(base)?);

        while levels.len() < max_levels {
            let Some(prev) = levels.last() else { break };
            let src = prev.view();
            let dst_width = src.width() / 2;
            let dst_height = src.height() / 2;
            if dst_width < min_size.max(1) || dst_height < min_size.max(1) {
                break;
            }

            let mut dst = vec![0u8; dst_width * dst_height];
            for y in 0..dst_height {
                let src_data = prev.data();
                let row0 = &src_data[(2 * y) * src.width()..(2 * y + 1) * src.width()];
                let row1 = &src_data[(2 * y + 1) * src.width()..(2 * y + 2) * src.width()];
                for x in 0..dst_width {
                    let sum = u16::from(row0[2 * x])
                        + u16::from(row0[2 * x + 1])
                        + u16::from(row1[2 * x])
                        + u16::from(row1[2 * x + 1]);
                    dst[y * dst_width + x] = ((sum + 2) / 4) as u8;
                }
            }

            levels.push(GrayImage::new(dst, dst_width, dst_height)?);
        }

        Ok(Self { levels })
    }

    /// Returns all pyramid levels (level 0 is the base resolution).
    pub fn levels(&self) -> &[GrayImage] {
        &self.levels
    }

    /// Returns a view for a specific pyramid level.
    pub fn level(&self, index: usize) -> Option<ImageView<'_, u8>> {
        self.levels.get(index).map(|level| level.view())
    }

    /// Returns the number of levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Returns true when the pyramid has no levels.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Maps a pixel coordinate at `level` back to level-0 pixel coordinates.
#[inline]
pub fn to_base_coord(coord: f32, level: usize) -> f32 {
    let scale = (1usize << level) as f32;
    (coord + 0.5) * scale - 0.5
}

/// Smooths an image with the separable 5-tap binomial kernel `[1 4 6 4 1] / 16`.
///
/// Borders are handled by clamping (replicating the edge pixels).
pub fn smooth_binomial5(src: ImageView<'_, u8>) -> DocAlignResult<GrayImage> {
    const TAPS: [u32; 5] = [1, 4, 6, 4, 1];
    let width = src.width();
    let height = src.height();

    let mut horiz = vec![0u32; width * height];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0u32;
            for (k, &tap) in TAPS.iter().enumerate() {
                let sx = x as isize + k as isize - 2;
                acc += tap * u32::from(src.at_clamped(sx, y as isize));
            }
            horiz[y * width + x] = acc;
        }
    }

    let mut out = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0u32;
            for (k, &tap) in TAPS.iter().enumerate() {
                let sy = (y as isize + k as isize - 2).clamp(0, height as isize - 1) as usize;
                acc += tap * horiz[sy * width + x];
            }
            out[y * width + x] = ((acc + 128) / 256) as u8;
        }
    }

    GrayImage::new(out, width, height)
}

fn copy_view(view: ImageView<'_, u8>) -> DocAlignResult<GrayImage> {
    let width = view.width();
    let height = view.height();
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        if let Some(row) = view.row(y) {
            data.extend_from_slice(row);
        }
    }
    GrayImage::new(data, width, height)
}

#[cfg(test)]
mod tests {
    use super::{smooth_binomial5, to_base_coord, ImagePyramid};
    use crate::image::GrayImage;

    #[test]
    fn pyramid_downsamples_by_two() {
        let data: Vec<u8> = (0u8..16).collect();
        let img = GrayImage::new(data, 4, 4).unwrap();

        let pyramid = ImagePyramid::build(img.view(), 10, 1).unwrap();
        assert_eq!(pyramid.len(), 3);

        let level1 = pyramid.level(1).unwrap();
        assert_eq!(level1.width(), 2);
        assert_eq!(level1.row(0).unwrap(), &[3u8, 5u8]);
        assert_eq!(level1.row(1).unwrap(), &[11u8, 13u8]);
    }

    #[test]
    fn pyramid_respects_min_size() {
        let img = GrayImage::filled(64, 64, 9).unwrap();
        let pyramid = ImagePyramid::build(img.view(), 8, 20).unwrap();
        // 64 -> 32 -> (16 < 20) stop
        assert_eq!(pyramid.len(), 2);
    }

    #[test]
    fn base_coord_maps_block_centers() {
        assert_eq!(to_base_coord(3.0, 0), 3.0);
        assert_eq!(to_base_coord(0.0, 1), 0.5);
        assert_eq!(to_base_coord(2.0, 2), 9.5);
    }

    #[test]
    fn smoothing_keeps_constant_images() {
        let img = GrayImage::filled(7, 5, 123).unwrap();
        let smoothed = smooth_binomial5(img.view()).unwrap();
        assert!(smoothed.data().iter().all(|&v| v == 123));
    }
}
