//! FAST-9 corner detection and Harris corner response.

use crate::image::ImageView;

/// Bresenham circle of radius 3, clockwise from north.
const CIRCLE: [(isize, isize); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

/// Contiguous arc length required for a corner.
const ARC_LEN: usize = 9;

/// A FAST corner in level coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Corner {
    pub(crate) x: usize,
    pub(crate) y: usize,
    pub(crate) score: u32,
}

/// Detects FAST-9 corners at least `border` pixels away from every edge,
/// followed by 3x3 non-maximum suppression on the corner score.
pub(crate) fn detect(image: ImageView<'_, u8>, threshold: u8, border: usize) -> Vec<Corner> {
    let width = image.width();
    let height = image.height();
    let border = border.max(3);
    if width <= 2 * border || height <= 2 * border {
        return Vec::new();
    }

    let mut scores = vec![0u32; width * height];
    for y in border..height - border {
        for x in border..width - border {
            scores[y * width + x] = corner_score(image, x, y, threshold);
        }
    }

    let mut corners = Vec::new();
    for y in border..height - border {
        for x in border..width - border {
            let score = scores[y * width + x];
            if score == 0 {
                continue;
            }
            if is_local_max(&scores, width, x, y, score) {
                corners.push(Corner { x, y, score });
            }
        }
    }
    corners
}

/// Keeps plateau maxima once: neighbors earlier in raster order must be
/// strictly smaller, later ones smaller or equal.
fn is_local_max(scores: &[u32], width: usize, x: usize, y: usize, score: u32) -> bool {
    for dy in -1isize..=1 {
        for dx in -1isize..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = (x as isize + dx) as usize;
            let ny = (y as isize + dy) as usize;
            let other = scores[ny * width + nx];
            let earlier = dy < 0 || (dy == 0 && dx < 0);
            if other > score || (earlier && other == score) {
                return false;
            }
        }
    }
    true
}

/// Returns the sum of absolute excess over the threshold along the circle if
/// `(x, y)` is a FAST-9 corner, otherwise 0.
fn corner_score(image: ImageView<'_, u8>, x: usize, y: usize, threshold: u8) -> u32 {
    let center = i32::from(image.at_clamped(x as isize, y as isize));
    let t = i32::from(threshold);
    let mut ring = [0i32; 16];
    for (slot, &(dx, dy)) in ring.iter_mut().zip(CIRCLE.iter()) {
        *slot = i32::from(image.at_clamped(x as isize + dx, y as isize + dy));
    }

    // Any arc of 9 contains at least two of the four compass points.
    let compass = [ring[0], ring[4], ring[8], ring[12]];
    let bright_hits = compass.iter().filter(|&&p| p > center + t).count();
    let dark_hits = compass.iter().filter(|&&p| p < center - t).count();
    if bright_hits < 2 && dark_hits < 2 {
        return 0;
    }

    let bright = has_arc(&ring, |p| p > center + t);
    let dark = has_arc(&ring, |p| p < center - t);
    if !bright && !dark {
        return 0;
    }

    let excess = |p: i32| {
        let d = (p - center).abs() - t;
        d.max(0) as u32
    };
    let bright_sum: u32 = ring.iter().filter(|&&p| p > center + t).map(|&p| excess(p)).sum();
    let dark_sum: u32 = ring.iter().filter(|&&p| p < center - t).map(|&p| excess(p)).sum();
    let bright_score = if bright { bright_sum } else { 0 };
    let dark_score = if dark { dark_sum } else { 0 };
    bright_score.max(dark_score).max(1)
}

fn has_arc(ring: &[i32; 16], pred: impl Fn(i32) -> bool) -> bool {
    let mut run = 0usize;
    for i in 0..ring.len() + ARC_LEN - 1 {
        if pred(ring[i % ring.len()]) {
            run += 1;
            if run >= ARC_LEN {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

/// Harris corner response over a `block x block` window with Sobel gradients.
pub(crate) fn harris_response(
    image: ImageView<'_, u8>,
    x: usize,
    y: usize,
    block: usize,
    k: f64,
) -> f64 {
    let r = (block / 2) as isize;
    let (cx, cy) = (x as isize, y as isize);
    let px = |x: isize, y: isize| f64::from(image.at_clamped(x, y));

    let mut a = 0.0f64;
    let mut b = 0.0f64;
    let mut c = 0.0f64;
    for yy in cy - r..=cy + r {
        for xx in cx - r..=cx + r {
            let gx = (px(xx + 1, yy - 1) + 2.0 * px(xx + 1, yy) + px(xx + 1, yy + 1))
                - (px(xx - 1, yy - 1) + 2.0 * px(xx - 1, yy) + px(xx - 1, yy + 1));
            let gy = (px(xx - 1, yy + 1) + 2.0 * px(xx, yy + 1) + px(xx + 1, yy + 1))
                - (px(xx - 1, yy - 1) + 2.0 * px(xx, yy - 1) + px(xx + 1, yy - 1));
            a += gx * gx;
            b += gy * gy;
            c += gx * gy;
        }
    }
    a * b - c * c - k * (a + b) * (a + b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::OwnedImage;

    fn square_image() -> OwnedImage {
        let (w, h) = (40, 40);
        let mut data = vec![20u8; w * h];
        for y in 15..40 {
            for x in 15..40 {
                data[y * w + x] = 220;
            }
        }
        OwnedImage::new(data, w, h).unwrap()
    }

    #[test]
    fn finds_the_corner_of_a_bright_square() {
        let img = square_image();
        let corners = detect(img.view(), 20, 3);
        assert!(!corners.is_empty());
        assert!(corners
            .iter()
            .any(|c| c.x.abs_diff(15) <= 1 && c.y.abs_diff(15) <= 1));
    }

    #[test]
    fn straight_edges_are_not_corners() {
        let (w, h) = (30, 30);
        let mut data = vec![0u8; w * h];
        for y in 0..h {
            for x in 15..w {
                data[y * w + x] = 200;
            }
        }
        let img = OwnedImage::new(data, w, h).unwrap();
        assert!(detect(img.view(), 20, 8).is_empty());
    }

    #[test]
    fn flat_images_have_no_corners() {
        let img = OwnedImage::new(vec![128u8; 32 * 32], 32, 32).unwrap();
        assert!(detect(img.view(), 20, 3).is_empty());
    }

    #[test]
    fn harris_prefers_corners_over_edges() {
        let img = square_image();
        let corner = harris_response(img.view(), 15, 15, 7, 0.04);
        let edge = harris_response(img.view(), 15, 30, 7, 0.04);
        assert!(corner > edge);
    }
}
