//! Side-by-side correspondence rendering.
//!
//! The input image is placed on the left and the template on the right, top
//! aligned on a black background of size `(w_image + w_template) x
//! max(h_image, h_template)`. Each correspondence is drawn as a line from the
//! image keypoint to the template keypoint (shifted right by `w_image`) with
//! a small circle at both ends. Colors cycle through a fixed palette, so the
//! output is fully determined by its inputs.

mod draw;

pub use draw::Rgb;

use crate::features::Keypoint;
use crate::image::Image;
use crate::matching::Correspondence;
use crate::util::DocAlignResult;
use draw::Canvas;

const PALETTE: [Rgb; 8] = [
    [0, 255, 0],
    [255, 0, 0],
    [0, 128, 255],
    [255, 200, 0],
    [255, 0, 255],
    [0, 255, 255],
    [255, 128, 0],
    [128, 0, 255],
];

const ENDPOINT_RADIUS: i64 = 3;

/// Renders the match diagnostic as a 3-channel RGB image.
///
/// Correspondences whose indices fall outside the keypoint slices are
/// skipped. An empty correspondence list yields the plain composite.
pub fn draw_matches(
    image: &Image,
    image_keypoints: &[Keypoint],
    template: &Image,
    template_keypoints: &[Keypoint],
    correspondences: &[Correspondence],
) -> DocAlignResult<Image> {
    let offset = image.width();
    let width = image.width() + template.width();
    let height = image.height().max(template.height());

    let mut canvas = Canvas::new(width, height);
    canvas.blit(image, 0);
    canvas.blit(template, offset);

    for (i, c) in correspondences.iter().enumerate() {
        let (Some(ikp), Some(tkp)) = (
            image_keypoints.get(c.image_idx),
            template_keypoints.get(c.template_idx),
        ) else {
            continue;
        };
        let color = PALETTE[i % PALETTE.len()];
        let from = (ikp.x.round() as i64, ikp.y.round() as i64);
        let to = (tkp.x.round() as i64 + offset as i64, tkp.y.round() as i64);
        canvas.line(from, to, color);
        canvas.circle(from, ENDPOINT_RADIUS, color);
        canvas.circle(to, ENDPOINT_RADIUS, color);
    }

    canvas.into_image()
}
