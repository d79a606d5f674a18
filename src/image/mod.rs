//! Image containers used throughout the pipeline.
//!
//! `Image` is an owned, interleaved 8-bit raster with an explicit channel
//! count (1 for intensity, 3 for RGB; 4 for RGBA is tolerated at the
//! boundary). `GrayImage` is the single-channel owned buffer produced by the
//! grayscale normalizer and consumed by keypoint extraction, and `ImageView`
//! is a borrowed 2D view into a 1D buffer with an explicit stride.
//!
//! Every stage produces a new image; none of these types are mutated after a
//! stage hands them on.

use crate::util::{DocAlignError, DocAlignResult};

pub mod gray;
#[cfg(feature = "image-io")]
pub mod io;
pub mod pyramid;

/// Borrowed 2D image view with an explicit stride.
#[derive(Copy, Clone)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> DocAlignResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a view with an explicit stride.
    pub fn new(data: &'a [T], width: usize, height: usize, stride: usize) -> DocAlignResult<Self> {
        if width == 0 || height == 0 {
            return Err(DocAlignError::InvalidDimensions { width, height });
        }
        if stride < width {
            return Err(DocAlignError::InvalidImage {
                reason: "stride is smaller than width",
            });
        }
        let needed = (height - 1)
            .checked_mul(stride)
            .and_then(|v| v.checked_add(width))
            .ok_or(DocAlignError::InvalidDimensions { width, height })?;
        if data.len() < needed {
            return Err(DocAlignError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the element at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y.checked_mul(self.stride)?.checked_add(x)?;
        self.data.get(idx)
    }

    /// Returns a contiguous slice for row `y` with length `width`.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width)?;
        self.data.get(start..end)
    }
}

impl ImageView<'_, u8> {
    /// Returns the pixel at `(x, y)` with coordinates clamped to the image.
    #[inline]
    pub(crate) fn at_clamped(&self, x: isize, y: isize) -> u8 {
        let cx = x.clamp(0, self.width as isize - 1) as usize;
        let cy = y.clamp(0, self.height as isize - 1) as usize;
        self.data[cy * self.stride + cx]
    }
}

/// Owned contiguous single-channel image buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl GrayImage {
    /// Creates an owned grayscale image from a contiguous buffer.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> DocAlignResult<Self> {
        let expected = checked_len(width, height, 1)?;
        check_len(expected, data.len())?;
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Creates an image filled with a constant intensity.
    pub fn filled(width: usize, height: usize, value: u8) -> DocAlignResult<Self> {
        let len = checked_len(width, height, 1)?;
        Self::new(vec![value; len], width, height)
    }

    /// Returns a borrowed view of the image.
    pub fn view(&self) -> ImageView<'_, u8> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the contiguous pixel buffer.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Owned interleaved 8-bit image with an explicit channel count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    data: Vec<u8>,
    width: usize,
    height: usize,
    channels: usize,
}

impl Image {
    /// Creates an image from an interleaved buffer of `width * height * channels` bytes.
    pub fn new(data: Vec<u8>, width: usize, height: usize, channels: usize) -> DocAlignResult<Self> {
        if channels == 0 {
            return Err(DocAlignError::InvalidImage {
                reason: "image has zero channels",
            });
        }
        let expected = checked_len(width, height, channels)?;
        check_len(expected, data.len())?;
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    /// Creates an image where every pixel equals `pixel` (one value per channel).
    pub fn filled(width: usize, height: usize, pixel: &[u8]) -> DocAlignResult<Self> {
        let channels = pixel.len();
        if channels == 0 {
            return Err(DocAlignError::InvalidImage {
                reason: "image has zero channels",
            });
        }
        let len = checked_len(width, height, channels)?;
        let data = pixel.iter().copied().cycle().take(len).collect();
        Self::new(data, width, height, channels)
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of interleaved channels per pixel.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the interleaved pixel buffer.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the image and returns its pixel buffer.
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Returns the channel values of the pixel at `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y * self.width + x) * self.channels;
        self.data.get(start..start + self.channels)
    }

    /// Returns the interleaved bytes of row `y`.
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let row_len = self.width * self.channels;
        let start = y * row_len;
        self.data.get(start..start + row_len)
    }
}

impl From<GrayImage> for Image {
    fn from(gray: GrayImage) -> Self {
        Self {
            data: gray.data,
            width: gray.width,
            height: gray.height,
            channels: 1,
        }
    }
}

fn checked_len(width: usize, height: usize, channels: usize) -> DocAlignResult<usize> {
    if width == 0 || height == 0 {
        return Err(DocAlignError::InvalidDimensions { width, height });
    }
    width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(channels))
        .ok_or(DocAlignError::InvalidDimensions { width, height })
}

fn check_len(expected: usize, got: usize) -> DocAlignResult<()> {
    if got < expected {
        return Err(DocAlignError::BufferTooSmall {
            needed: expected,
            got,
        });
    }
    if got > expected {
        return Err(DocAlignError::BufferSizeMismatch { expected, got });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{GrayImage, Image, ImageView};
    use crate::util::DocAlignError;

    #[test]
    fn image_rejects_zero_channels() {
        let err = Image::new(Vec::new(), 2, 2, 0).unwrap_err();
        assert_eq!(
            err,
            DocAlignError::InvalidImage {
                reason: "image has zero channels"
            }
        );
    }

    #[test]
    fn image_pixel_reads_interleaved_values() {
        let data: Vec<u8> = (0u8..12).collect();
        let img = Image::new(data, 2, 2, 3).unwrap();
        assert_eq!(img.pixel(1, 0).unwrap(), &[3u8, 4, 5]);
        assert_eq!(img.pixel(0, 1).unwrap(), &[6u8, 7, 8]);
        assert!(img.pixel(2, 0).is_none());
        assert_eq!(img.row(1).unwrap().len(), 6);
    }

    #[test]
    fn filled_repeats_pixel() {
        let img = Image::filled(3, 2, &[10, 20, 30]).unwrap();
        assert_eq!(img.data().len(), 18);
        assert_eq!(img.pixel(2, 1).unwrap(), &[10u8, 20, 30]);
    }

    #[test]
    fn gray_view_clamps_out_of_range_reads() {
        let gray = GrayImage::new(vec![1, 2, 3, 4], 2, 2).unwrap();
        let view = gray.view();
        assert_eq!(view.at_clamped(-5, -5), 1);
        assert_eq!(view.at_clamped(9, 9), 4);
    }

    #[test]
    fn view_rejects_invalid_stride() {
        let data = [0u8; 8];
        assert!(ImageView::new(&data, 4, 1, 3).is_err());
    }
}
