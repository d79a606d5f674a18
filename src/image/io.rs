//! Conversions between the `image` crate and docalign images.
//!
//! Available when the `image-io` feature is enabled. This is the single
//! place where decoded pictures are normalized into the pipeline's `Image`
//! layout: grayscale-like inputs become one channel, everything else RGB.

use crate::image::Image;
use crate::util::{DocAlignError, DocAlignResult};
use image::{ColorType, DynamicImage};
use std::path::Path;

/// Converts a decoded image into a 1- or 3-channel `Image`, dropping alpha.
pub fn from_dynamic_image(img: &DynamicImage) -> DocAlignResult<Image> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    match img.color() {
        ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16 => {
            Image::new(img.to_luma8().into_raw(), width, height, 1)
        }
        _ => Image::new(img.to_rgb8().into_raw(), width, height, 3),
    }
}

/// Converts a 1-, 3- or 4-channel `Image` back into a `DynamicImage`.
pub fn to_dynamic_image(img: &Image) -> DocAlignResult<DynamicImage> {
    let width = img.width() as u32;
    let height = img.height() as u32;
    let data = img.data().to_vec();
    let converted = match img.channels() {
        1 => image::GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8),
        3 => image::RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8),
        4 => image::RgbaImage::from_raw(width, height, data).map(DynamicImage::ImageRgba8),
        _ => None,
    };
    converted.ok_or(DocAlignError::InvalidImage {
        reason: "cannot encode this channel layout",
    })
}

/// Loads an image from disk.
pub fn load_image<P: AsRef<Path>>(path: P) -> DocAlignResult<Image> {
    let img = image::open(path).map_err(|err| DocAlignError::ImageIo {
        reason: err.to_string(),
    })?;
    from_dynamic_image(&img)
}

/// Saves an image to disk; the format is chosen from the file extension.
pub fn save_image<P: AsRef<Path>>(img: &Image, path: P) -> DocAlignResult<()> {
    let dynamic = to_dynamic_image(img)?;
    let dynamic = match img.channels() {
        // JPEG cannot carry alpha.
        4 => DynamicImage::ImageRgb8(dynamic.to_rgb8()),
        _ => dynamic,
    };
    dynamic.save(path).map_err(|err| DocAlignError::ImageIo {
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{from_dynamic_image, to_dynamic_image};
    use crate::image::Image;
    use image::{DynamicImage, GrayAlphaImage, LumaA, Rgba, RgbaImage};

    #[test]
    fn rgba_input_becomes_rgb() {
        let rgba = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 40]));
        let img = from_dynamic_image(&DynamicImage::ImageRgba8(rgba)).unwrap();
        assert_eq!(img.channels(), 3);
        assert_eq!(img.pixel(2, 1).unwrap(), &[10u8, 20, 30]);
    }

    #[test]
    fn gray_alpha_input_becomes_gray() {
        let la = GrayAlphaImage::from_pixel(2, 2, LumaA([99, 0]));
        let img = from_dynamic_image(&DynamicImage::ImageLumaA8(la)).unwrap();
        assert_eq!(img.channels(), 1);
        assert_eq!(img.data(), &[99u8; 4]);
    }

    #[test]
    fn two_channel_images_cannot_be_encoded() {
        let img = Image::filled(2, 2, &[1, 2]).unwrap();
        assert!(to_dynamic_image(&img).is_err());
    }
}
