//! Connected regions of a binary mask.
//!
//! Regions are 8-connected and measured by pixel count. Labelling is a
//! breadth-first flood fill from every unvisited foreground pixel.

use std::collections::VecDeque;

/// A connected foreground region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    /// Number of pixels in the region.
    pub area: usize,
    /// Bounding box `(x0, y0, x1, y1)`, inclusive.
    pub bounds: (usize, usize, usize, usize),
}

/// Extracts all 8-connected regions of a row-major mask.
///
/// Returns an empty list if the mask length does not match the dimensions.
pub fn find_regions(mask: &[bool], width: usize, height: usize) -> Vec<Region> {
    if width == 0 || height == 0 || mask.len() != width * height {
        return Vec::new();
    }

    let mut visited = vec![false; mask.len()];
    let mut regions = Vec::new();
    let mut queue = VecDeque::new();

    for start in 0..mask.len() {
        if !mask[start] || visited[start] {
            continue;
        }
        visited[start] = true;
        queue.push_back(start);

        let mut area = 0usize;
        let (mut x0, mut y0) = (usize::MAX, usize::MAX);
        let (mut x1, mut y1) = (0usize, 0usize);

        while let Some(idx) = queue.pop_front() {
            let x = idx % width;
            let y = idx / width;
            area += 1;
            x0 = x0.min(x);
            y0 = y0.min(y);
            x1 = x1.max(x);
            y1 = y1.max(y);

            let ny0 = y.saturating_sub(1);
            let ny1 = (y + 1).min(height - 1);
            let nx0 = x.saturating_sub(1);
            let nx1 = (x + 1).min(width - 1);
            for ny in ny0..=ny1 {
                for nx in nx0..=nx1 {
                    let nidx = ny * width + nx;
                    if mask[nidx] && !visited[nidx] {
                        visited[nidx] = true;
                        queue.push_back(nidx);
                    }
                }
            }
        }

        regions.push(Region {
            area,
            bounds: (x0, y0, x1, y1),
        });
    }

    regions
}

/// Returns the area of the largest region, or `None` when the mask is empty.
pub fn largest_region_area(mask: &[bool], width: usize, height: usize) -> Option<usize> {
    find_regions(mask, width, height)
        .iter()
        .map(|region| region.area)
        .max()
}
