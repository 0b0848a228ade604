#![cfg(feature = "rayon")]

use cluedoid::correlate::{best_zncc, best_zncc_par, ZnccPlan};
use cluedoid::{Frame, IdentifyConfig, Identifier, OwnedImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn block_gray(width: usize, height: usize, block: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let cols = width.div_ceil(block);
    let rows = height.div_ceil(block);
    let cells: Vec<u8> = (0..cols * rows).map(|_| rng.random_range(0..=255)).collect();
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            data.push(cells[(y / block) * cols + x / block]);
        }
    }
    data
}

#[test]
fn parallel_matching_matches_sequential() {
    let (w, h) = (240, 240);
    let gray = block_gray(w, h, 8, 3);
    let rgb = gray.iter().flat_map(|&v| [v, v, v]).collect();
    let mut frame = Frame::from_rgb(rgb, w, h).unwrap();
    frame.fill_rect(20, 180, 30, 30, [0, 220, 220]);

    let images: Vec<(String, OwnedImage)> = [("mustard", 9u64), ("peacock", 0), ("plum", 10)]
        .into_iter()
        .map(|(name, seed)| {
            let image = if seed == 0 {
                frame.to_gray()
            } else {
                OwnedImage::new(block_gray(160, 160, 8, seed), 160, 160).unwrap()
            };
            (name.to_string(), image)
        })
        .collect();

    let sequential = Identifier::from_images(images.clone(), IdentifyConfig::default()).unwrap();
    let parallel = Identifier::from_images(
        images,
        IdentifyConfig {
            parallel: true,
            ..IdentifyConfig::default()
        },
    )
    .unwrap();

    let a = sequential.identify_detailed(&frame);
    let b = parallel.identify_detailed(&frame);
    assert_eq!(a, b);
    assert_eq!(a.verdict.character.as_deref(), Some("peacock"));
}

#[test]
fn parallel_scan_matches_sequential() {
    let (w, h) = (96, 80);
    let image = OwnedImage::new(block_gray(w, h, 3, 17), w, h).unwrap();
    let tpl = OwnedImage::new(block_gray(12, 10, 2, 18), 12, 10).unwrap();
    let plan = ZnccPlan::from_view(tpl.view()).unwrap();
    assert_eq!(
        best_zncc(image.view(), &plan),
        best_zncc_par(image.view(), &plan)
    );
}
