use cluedoid::correlate::{best_zncc, correlate, CorrelationConfig, ZnccPlan};
use cluedoid::image::pyramid::resize_by;
use cluedoid::{Frame, IdentError, IdentifyConfig, Identifier, OrbDetector, OwnedImage, TemplateStore};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn block_gray(width: usize, height: usize, block: usize, seed: u64) -> OwnedImage {
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
    OwnedImage::new(data, width, height).unwrap()
}

fn noise(width: usize, height: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..width * height).map(|_| rng.random_range(0..=255)).collect()
}

/// Pastes `patch` into a gray canvas and returns it as an RGB frame.
fn frame_with_patch(
    canvas: &mut [u8],
    width: usize,
    height: usize,
    patch: &OwnedImage,
    x0: usize,
    y0: usize,
) -> Frame {
    for y in 0..patch.height() {
        for x in 0..patch.width() {
            canvas[(y0 + y) * width + x0 + x] = patch.data()[y * patch.width() + x];
        }
    }
    let rgb = canvas.iter().flat_map(|&v| [v, v, v]).collect();
    Frame::from_rgb(rgb, width, height).unwrap()
}

fn plum_and_friends() -> Vec<(String, OwnedImage)> {
    vec![
        ("plum".to_string(), block_gray(200, 200, 8, 42)),
        ("mustard".to_string(), block_gray(200, 200, 8, 43)),
        ("peacock".to_string(), OwnedImage::new(vec![77u8; 200 * 200], 200, 200).unwrap()),
    ]
}

#[test]
fn finds_embedded_thumbnail_at_full_scale() {
    let identifier = Identifier::from_images(plum_and_friends(), IdentifyConfig::default()).unwrap();
    let thumb = identifier.store().get("plum").unwrap().thumbnail().unwrap().clone();
    assert_eq!((thumb.width(), thumb.height()), (20, 20));

    let (w, h) = (120, 100);
    let mut canvas = noise(w, h, 5);
    let frame = frame_with_patch(&mut canvas, w, h, &thumb, 37, 52);

    let hit = identifier.correlate(&frame).unwrap();
    assert_eq!(hit.name, "plum");
    assert!(hit.score > 0.99);
    assert_eq!(hit.scale, 1.0);
    assert_eq!((hit.x, hit.y), (37.0, 52.0));
    assert!(identifier.identify_by_correlation(&frame).matched);
}

#[test]
fn unrelated_frame_has_no_hit() {
    let identifier = Identifier::from_images(plum_and_friends(), IdentifyConfig::default()).unwrap();
    let frame = Frame::filled(120, 100, [30, 30, 30]).unwrap();
    assert!(identifier.correlate(&frame).is_none());
    assert!(!identifier.identify_by_correlation(&frame).matched);
}

#[test]
fn frame_smaller_than_thumbnail_stops_the_scan() {
    let detector = OrbDetector::default();
    let store = TemplateStore::build(plum_and_friends(), &detector, 0.1);
    let tiny = OwnedImage::new(noise(15, 15, 8), 15, 15).unwrap();
    assert!(correlate(tiny.view(), &store, &CorrelationConfig::default()).is_none());
}

#[test]
fn downscaled_frame_is_found_at_a_lower_scale() {
    let detector = OrbDetector::default();
    let store = TemplateStore::build(plum_and_friends(), &detector, 0.1);
    let thumb = store.get("plum").unwrap().thumbnail().unwrap().clone();

    // A frame that is the thumbnail upscaled to 2x: at 50% it is the thumbnail again.
    let big = resize_by(thumb.view(), 2.0).unwrap();
    let back = resize_by(big.view(), 0.5).unwrap();
    let plan = ZnccPlan::from_view(thumb.view()).unwrap();
    let direct = best_zncc(back.view(), &plan).unwrap();
    assert!(direct.score > 0.9);

    let hit = correlate(big.view(), &store, &CorrelationConfig::default()).unwrap();
    assert_eq!(hit.name, "plum");
    assert!(hit.scale <= 0.6, "scale {}", hit.scale);
    assert!(hit.score >= 0.8);
}

#[test]
fn flat_plan_is_degenerate() {
    let flat = OwnedImage::new(vec![9u8; 25], 5, 5).unwrap();
    assert_eq!(
        ZnccPlan::from_view(flat.view()).unwrap_err(),
        IdentError::DegenerateTemplate {
            reason: "zero variance"
        }
    );
}
