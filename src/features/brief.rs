//! Orientation and steered BRIEF descriptors.
//!
//! The sampling pattern is 256 point pairs inside a 31x31 patch, drawn once
//! at compile time from a fixed-seed xorshift generator. Each coordinate is
//! the sum of three uniform draws, which concentrates samples near the
//! keypoint. Pairs are rotated by the keypoint orientation before sampling.

use crate::features::{Descriptor, DESCRIPTOR_BYTES};
use crate::image::{ImageView, OwnedImage};

/// Radius of the orientation disc and half the patch size.
pub(crate) const HALF_PATCH: isize = 15;

const PATTERN_BITS: usize = DESCRIPTOR_BYTES * 8;

static PATTERN: [[i8; 4]; PATTERN_BITS] = build_pattern();

const fn build_pattern() -> [[i8; 4]; PATTERN_BITS] {
    let mut out = [[0i8; 4]; PATTERN_BITS];
    let mut state: u32 = 0x9E37_79B9;
    let mut i = 0;
    while i < PATTERN_BITS {
        let mut pair = [0i8; 4];
        let mut j = 0;
        while j < 4 {
            let mut acc: i32 = 0;
            let mut k = 0;
            while k < 3 {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                acc += (state % 9) as i32 - 4;
                k += 1;
            }
            pair[j] = acc as i8;
            j += 1;
        }
        // Identical endpoints would yield a constant bit.
        if pair[0] != pair[2] || pair[1] != pair[3] {
            out[i] = pair;
            i += 1;
        }
    }
    out
}

/// Intensity-centroid orientation in radians, measured on a disc of radius
/// [`HALF_PATCH`] around `(x, y)`.
pub(crate) fn orientation(image: ImageView<'_, u8>, x: usize, y: usize) -> f32 {
    let (cx, cy) = (x as isize, y as isize);
    let mut m01 = 0i64;
    let mut m10 = 0i64;
    for dy in -HALF_PATCH..=HALF_PATCH {
        for dx in -HALF_PATCH..=HALF_PATCH {
            if dx * dx + dy * dy > HALF_PATCH * HALF_PATCH {
                continue;
            }
            let value = i64::from(image.at_clamped(cx + dx, cy + dy));
            m10 += value * dx as i64;
            m01 += value * dy as i64;
        }
    }
    (m01 as f32).atan2(m10 as f32)
}

/// Separable 5-tap binomial blur (`[1 4 6 4 1] / 16`) with clamped borders.
pub(crate) fn smooth(image: ImageView<'_, u8>) -> OwnedImage {
    const TAPS: [u32; 5] = [1, 4, 6, 4, 1];
    let width = image.width();
    let height = image.height();

    let mut horizontal = vec![0u32; width * height];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0u32;
            for (i, &w) in TAPS.iter().enumerate() {
                let sx = x as isize + i as isize - 2;
                acc += w * u32::from(image.at_clamped(sx, y as isize));
            }
            horizontal[y * width + x] = acc;
        }
    }

    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0u32;
            for (i, &w) in TAPS.iter().enumerate() {
                let sy = (y as isize + i as isize - 2).clamp(0, height as isize - 1) as usize;
                acc += w * horizontal[sy * width + x];
            }
            data.push(((acc + 128) / 256) as u8);
        }
    }

    OwnedImage::from_parts(data, width, height)
}

/// Computes a steered BRIEF descriptor on a pre-smoothed image.
pub(crate) fn describe(smoothed: ImageView<'_, u8>, x: usize, y: usize, angle: f32) -> Descriptor {
    let (sin, cos) = angle.sin_cos();
    let (cx, cy) = (x as isize, y as isize);
    let rotate = |px: i8, py: i8| {
        let (px, py) = (f32::from(px), f32::from(py));
        let rx = (px * cos - py * sin).round() as isize;
        let ry = (px * sin + py * cos).round() as isize;
        (rx, ry)
    };

    let mut bytes = [0u8; DESCRIPTOR_BYTES];
    for (bit, &[x1, y1, x2, y2]) in PATTERN.iter().enumerate() {
        let (ax, ay) = rotate(x1, y1);
        let (bx, by) = rotate(x2, y2);
        let a = smoothed.at_clamped(cx + ax, cy + ay);
        let b = smoothed.at_clamped(cx + bx, cy + by);
        if a < b {
            bytes[bit / 8] |= 1 << (bit % 8);
        }
    }
    Descriptor(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_stays_inside_the_patch() {
        for pair in PATTERN.iter() {
            assert!(pair.iter().all(|&c| (-12..=12).contains(&c)));
            assert!(pair[0] != pair[2] || pair[1] != pair[3]);
        }
    }

    #[test]
    fn orientation_points_towards_the_bright_side() {
        let (w, h) = (41, 41);
        let mut data = vec![0u8; w * h];
        for y in 0..h {
            for x in 21..w {
                data[y * w + x] = 255;
            }
        }
        let img = OwnedImage::new(data, w, h).unwrap();
        let angle = orientation(img.view(), 20, 20);
        assert!(angle.abs() < 0.05);
    }

    #[test]
    fn smoothing_preserves_flat_regions() {
        let img = OwnedImage::new(vec![90u8; 12 * 9], 12, 9).unwrap();
        let smoothed = smooth(img.view());
        assert!(smoothed.data().iter().all(|&v| v == 90));
    }

    #[test]
    fn flat_patch_gives_zero_descriptor() {
        let img = OwnedImage::new(vec![50u8; 40 * 40], 40, 40).unwrap();
        let desc = describe(img.view(), 20, 20, 0.7);
        assert_eq!(desc.0, [0u8; DESCRIPTOR_BYTES]);
    }
}
