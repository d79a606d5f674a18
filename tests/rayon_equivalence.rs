#![cfg(feature = "rayon")]

use docalign::lowlevel::{match_descriptors, match_descriptors_par};
use docalign::{Image, KeypointExtractor, OrbExtractor, ScanConfig, Scanner};

fn make_document(width: usize, height: usize, shift: usize) -> Image {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let (bx, by) = ((x + shift) / 6, (y + shift) / 6);
            let value = ((bx * 37) ^ (by * 91) ^ (bx * by * 13)) & 0xFF;
            data.push(value as u8);
        }
    }
    Image::new(data, width, height, 1).unwrap()
}

#[test]
fn parallel_scan_matches_sequential() {
    let image = make_document(300, 260, 0);
    let template = make_document(300, 260, 12);

    let sequential = Scanner::new(ScanConfig {
        retain_fraction: 15.0,
        ..ScanConfig::default()
    })
    .unwrap();
    let parallel = Scanner::new(ScanConfig {
        retain_fraction: 15.0,
        parallel: true,
        ..ScanConfig::default()
    })
    .unwrap();

    let a = sequential.scan(&image, &template).unwrap();
    let b = parallel.scan(&image, &template).unwrap();

    assert_eq!(a.correspondences, b.correspondences);
    assert_eq!(a.homography, b.homography);
    assert_eq!(a.rectified, b.rectified);
    assert_eq!(a.visualization, b.visualization);
    assert_eq!(a.error, b.error);
}

#[test]
fn parallel_matching_matches_sequential() {
    let orb = OrbExtractor::default();
    let image = docalign::to_gray(&make_document(200, 200, 0)).unwrap();
    let template = docalign::to_gray(&make_document(200, 200, 5)).unwrap();
    let image_kps = orb.extract(image.view(), 300).unwrap();
    let template_kps = orb.extract(template.view(), 300).unwrap();

    assert_eq!(
        match_descriptors(&template_kps, &image_kps),
        match_descriptors_par(&template_kps, &image_kps)
    );
}
