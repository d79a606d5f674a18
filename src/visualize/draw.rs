//! Raster primitives on an RGB canvas.

use crate::image::Image;
use crate::util::DocAlignResult;

/// RGB color.
pub type Rgb = [u8; 3];

/// Mutable 3-channel drawing surface.
pub(crate) struct Canvas {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl Canvas {
    /// Creates a black canvas.
    pub(crate) fn new(width: usize, height: usize) -> Self {
        Self {
            data: vec![0; width * height * 3],
            width,
            height,
        }
    }

    /// Copies `src` with its top-left corner at `(x0, 0)`, expanding
    /// intensity and dropping alpha.
    pub(crate) fn blit(&mut self, src: &Image, x0: usize) {
        let channels = src.channels();
        for y in 0..src.height().min(self.height) {
            let Some(row) = src.row(y) else { continue };
            for (x, px) in row.chunks_exact(channels).enumerate() {
                let rgb = if channels >= 3 {
                    [px[0], px[1], px[2]]
                } else {
                    [px[0]; 3]
                };
                self.put(x0 as i64 + x as i64, y as i64, rgb);
            }
        }
    }

    #[inline]
    pub(crate) fn put(&mut self, x: i64, y: i64, color: Rgb) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = (y as usize * self.width + x as usize) * 3;
        self.data[idx..idx + 3].copy_from_slice(&color);
    }

    /// Bresenham line between two integer points, clipped to the canvas.
    pub(crate) fn line(&mut self, from: (i64, i64), to: (i64, i64), color: Rgb) {
        let (mut x0, mut y0) = from;
        let (x1, y1) = to;
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.put(x0, y0, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// Hollow circle of the given radius (one pixel thick).
    pub(crate) fn circle(&mut self, center: (i64, i64), radius: i64, color: Rgb) {
        let (cx, cy) = center;
        let outer = radius * radius;
        let inner = (radius - 1).max(0).pow(2);
        for y in cy - radius..=cy + radius {
            for x in cx - radius..=cx + radius {
                let d = (x - cx).pow(2) + (y - cy).pow(2);
                if d <= outer && d > inner {
                    self.put(x, y, color);
                }
            }
        }
    }

    pub(crate) fn into_image(self) -> DocAlignResult<Image> {
        Image::new(self.data, self.width, self.height, 3)
    }
}

#[cfg(test)]
mod tests {
    use super::Canvas;

    #[test]
    fn line_covers_both_endpoints() {
        let mut canvas = Canvas::new(10, 10);
        canvas.line((1, 8), (7, 2), [255, 0, 0]);
        let img = canvas.into_image().unwrap();
        assert_eq!(img.pixel(1, 8).unwrap(), &[255u8, 0, 0]);
        assert_eq!(img.pixel(7, 2).unwrap(), &[255u8, 0, 0]);
        assert_eq!(img.pixel(4, 5).unwrap(), &[255u8, 0, 0]);
        assert_eq!(img.pixel(0, 0).unwrap(), &[0u8, 0, 0]);
    }

    #[test]
    fn drawing_outside_is_clipped() {
        let mut canvas = Canvas::new(4, 4);
        canvas.line((-10, -10), (20, 20), [1, 2, 3]);
        canvas.circle((0, 0), 6, [9, 9, 9]);
        let img = canvas.into_image().unwrap();
        assert_eq!(img.pixel(2, 2).unwrap(), &[1u8, 2, 3]);
    }
}
