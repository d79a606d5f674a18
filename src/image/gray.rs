//! Grayscale normalization.
//!
//! Color pixels are reduced with the ITU-R BT.601 luma weights in 14-bit
//! fixed point (`Y = 0.299 R + 0.587 G + 0.114 B`), rounded to nearest. The
//! fixed-point form keeps the conversion bit-exact across platforms.

use crate::image::{GrayImage, Image};
use crate::util::{DocAlignError, DocAlignResult};

const LUMA_SHIFT: u32 = 14;
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;
const LUMA_ROUND: u32 = 1 << (LUMA_SHIFT - 1);

/// Converts an RGB triple to its luma value.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = LUMA_R * r as u32 + LUMA_G * g as u32 + LUMA_B * b as u32 + LUMA_ROUND;
    (y >> LUMA_SHIFT) as u8
}

/// Converts a 1-, 3- or 4-channel image to a single-channel intensity image.
///
/// Single-channel input is copied as is. Three channels are read as RGB and
/// four as RGBA with the alpha channel ignored. Any other channel count is
/// rejected with [`DocAlignError::InvalidImage`].
pub fn to_gray(img: &Image) -> DocAlignResult<GrayImage> {
    let data = match img.channels() {
        1 => img.data().to_vec(),
        3 | 4 => img
            .data()
            .chunks_exact(img.channels())
            .map(|px| luma(px[0], px[1], px[2]))
            .collect(),
        _ => {
            return Err(DocAlignError::InvalidImage {
                reason: "unsupported channel count (expected 1, 3 or 4)",
            })
        }
    };
    GrayImage::new(data, img.width(), img.height())
}
