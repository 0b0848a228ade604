use cluedoid::{
    DetectionSink, FailureCause, Frame, FrameSlot, IdentError, IdentResult, IdentifyConfig,
    IdentifyService, Identifier, MemorySink, OwnedImage, Verdict,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

const RED: [u8; 3] = [200, 0, 0];

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

fn gray_frame(gray: &[u8], width: usize, height: usize) -> Frame {
    let rgb = gray.iter().flat_map(|&v| [v, v, v]).collect();
    Frame::from_rgb(rgb, width, height).unwrap()
}

/// A textured frame with a 30x30 red card in one corner.
fn red_card_frame() -> Frame {
    let mut frame = gray_frame(&block_gray(240, 240, 8, 1), 240, 240);
    frame.fill_rect(180, 20, 30, 30, RED);
    frame
}

fn flat(value: u8) -> OwnedImage {
    OwnedImage::new(vec![value; 120 * 120], 120, 120).unwrap()
}

/// Store where `hit` is a grayscale copy of the frame and everyone else is flat.
fn identifier_with(frame: &Frame, hit: &str, names: &[&str]) -> Identifier {
    let images = names
        .iter()
        .map(|&name| {
            let image = if name == hit { frame.to_gray() } else { flat(60) };
            (name.to_string(), image)
        })
        .collect();
    Identifier::from_images(images, IdentifyConfig::default()).unwrap()
}

const ALL: [&str; 4] = ["mustard", "peacock", "plum", "scarlet"];

#[test]
fn red_card_is_identified_as_scarlet() {
    let frame = red_card_frame();
    let identifier = identifier_with(&frame, "scarlet", &ALL);
    let identification = identifier.identify_detailed(&frame);

    assert_eq!(identification.verdict, Verdict::matched("scarlet"));
    assert_eq!(identification.color.map(|c| c.0), Some(0));
    assert_eq!(identification.cause, None);
    let counts: Vec<_> = identification
        .results
        .iter()
        .map(|r| (r.template_name.as_str(), r.good_matches))
        .collect();
    assert_eq!(counts.len(), 4);
    assert_eq!(&counts[..3], &[("mustard", 0), ("peacock", 0), ("plum", 0)]);
    assert!(counts[3].1 >= 20);
}

#[test]
fn identification_is_idempotent() {
    let frame = red_card_frame();
    let identifier = identifier_with(&frame, "scarlet", &ALL);
    let first = identifier.identify_detailed(&frame);
    let second = identifier.identify_detailed(&frame);
    assert_eq!(first, second);
    assert_eq!(identifier.identify(&frame), first.verdict);
}

#[test]
fn strong_match_with_wrong_color_fails() {
    let frame = red_card_frame();
    let identifier = identifier_with(&frame, "mustard", &ALL);
    let identification = identifier.identify_detailed(&frame);
    assert!(identification.results[0].good_matches >= 20);
    assert_eq!(identification.verdict, Verdict::no_match());
    assert_eq!(identification.cause, Some(FailureCause::NoCandidate));
}

#[test]
fn colorless_frame_fails() {
    let frame = gray_frame(&block_gray(240, 240, 8, 1), 240, 240);
    let identifier = identifier_with(&frame, "scarlet", &ALL);
    let identification = identifier.identify_detailed(&frame);
    assert_eq!(identification.color, None);
    assert!(!identification.verdict.matched);
}

#[test]
fn store_without_scarlet_never_answers_scarlet() {
    let frame = red_card_frame();
    let identifier = identifier_with(&frame, "plum", &["mustard", "peacock", "plum"]);
    assert_eq!(identifier.store().len(), 3);
    assert!(identifier.store().get("scarlet").is_none());
    assert_eq!(identifier.identify(&frame), Verdict::no_match());
}

#[test]
fn empty_slot_fails_with_no_frame() {
    let frame = red_card_frame();
    let identifier = identifier_with(&frame, "scarlet", &ALL);
    let slot = FrameSlot::new();

    let identification = identifier.identify_current_detailed(&slot);
    assert_eq!(identification.verdict, Verdict::no_match());
    assert_eq!(identification.cause, Some(FailureCause::NoFrame));
    assert!(identification.results.is_empty());

    slot.publish(frame);
    assert_eq!(identifier.identify_current(&slot), Verdict::matched("scarlet"));
}

#[test]
fn trigger_records_successful_detections() {
    let frame = red_card_frame();
    let identifier = identifier_with(&frame, "scarlet", &ALL);
    let slot = Arc::new(FrameSlot::new());
    let sink = MemorySink::new();
    let service = IdentifyService::new(identifier, Arc::clone(&slot), &sink);

    assert!(!service.trigger());
    assert!(sink.is_empty());

    slot.publish(frame.clone());
    assert!(service.trigger());
    assert_eq!(sink.characters(), vec!["scarlet".to_string()]);
    let (saved, _) = sink.last().unwrap();
    assert_eq!(saved, frame);

    slot.publish(gray_frame(&block_gray(240, 240, 8, 1), 240, 240));
    assert!(!service.trigger());
    assert_eq!(sink.len(), 1);
}

struct FailingSink;

impl DetectionSink for FailingSink {
    fn record(&self, _frame: &Frame, _character: &str) -> IdentResult<()> {
        Err(IdentError::Io {
            path: "/dev/full".to_string(),
            reason: "disk full".to_string(),
        })
    }
}

#[test]
fn sink_failure_does_not_change_the_verdict() {
    let frame = red_card_frame();
    let identifier = identifier_with(&frame, "scarlet", &ALL);
    let slot = FrameSlot::new();
    slot.publish(frame);
    let service = IdentifyService::new(identifier, slot, FailingSink);
    assert!(service.trigger());
}

#[test]
fn invalid_config_is_rejected() {
    let cfg = IdentifyConfig {
        ratio: 1.5,
        ..IdentifyConfig::default()
    };
    assert_eq!(
        Identifier::from_images(Vec::new(), cfg).unwrap_err(),
        IdentError::InvalidConfig("ratio must be in (0, 1]")
    );
}
