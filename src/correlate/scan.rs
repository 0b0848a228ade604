//! Exhaustive ZNCC scan over all placements of a template.

use crate::correlate::plan::ZnccPlan;
use crate::image::ImageView;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Best placement found by a scan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    /// X coordinate (column) of the template's top-left corner.
    pub x: usize,
    /// Y coordinate (row) of the template's top-left corner.
    pub y: usize,
    /// ZNCC score in `[-1, 1]`.
    pub score: f32,
}

/// Minimum image-window variance; flat windows are skipped.
const MIN_VAR_I: f32 = 1e-3;

/// ZNCC at a single top-left placement, or `None` for a flat window.
fn score_at(image: ImageView<'_, u8>, tpl: &ZnccPlan, x: usize, y: usize) -> Option<f32> {
    let tpl_width = tpl.width();
    let t_prime = tpl.t_prime();
    let n = (tpl_width * tpl.height()) as f32;

    let mut dot = 0.0f32;
    let mut sum_i = 0.0f32;
    let mut sum_i2 = 0.0f32;
    for ty in 0..tpl.height() {
        let img_row = image.row(y + ty)?;
        let base = ty * tpl_width;
        for tx in 0..tpl_width {
            let value = f32::from(img_row[x + tx]);
            dot += t_prime[base + tx] * value;
            sum_i += value;
            sum_i2 += value * value;
        }
    }

    let var_i = sum_i2 - (sum_i * sum_i) / n;
    if var_i <= MIN_VAR_I {
        return None;
    }
    let score = dot / (tpl.var_t() * var_i).sqrt();
    score.is_finite().then_some(score)
}

/// Keeps the higher score; ties keep the earlier placement in raster order.
fn better(a: Option<Peak>, b: Option<Peak>) -> Option<Peak> {
    match (a, b) {
        (Some(a), Some(b)) => {
            if b.score > a.score || (b.score == a.score && (b.y, b.x) < (a.y, a.x)) {
                Some(b)
            } else {
                Some(a)
            }
        }
        (a, None) => a,
        (None, b) => b,
    }
}

fn best_in_row(image: ImageView<'_, u8>, tpl: &ZnccPlan, y: usize, max_x: usize) -> Option<Peak> {
    (0..=max_x)
        .filter_map(|x| score_at(image, tpl, x, y).map(|score| Peak { x, y, score }))
        .fold(None, |best, peak| better(best, Some(peak)))
}

/// Returns the best-scoring placement, or `None` if the template does not fit
/// or every window is flat.
pub fn best_zncc(image: ImageView<'_, u8>, tpl: &ZnccPlan) -> Option<Peak> {
    if image.width() < tpl.width() || image.height() < tpl.height() {
        return None;
    }
    let max_x = image.width() - tpl.width();
    let max_y = image.height() - tpl.height();
    (0..=max_y)
        .map(|y| best_in_row(image, tpl, y, max_x))
        .fold(None, better)
}

/// Row-parallel variant of [`best_zncc`]; returns the same peak.
#[cfg(feature = "rayon")]
pub fn best_zncc_par(image: ImageView<'_, u8>, tpl: &ZnccPlan) -> Option<Peak> {
    if image.width() < tpl.width() || image.height() < tpl.height() {
        return None;
    }
    let max_x = image.width() - tpl.width();
    let max_y = image.height() - tpl.height();
    let rows: Vec<Option<Peak>> = (0..=max_y)
        .into_par_iter()
        .map(|y| best_in_row(image, tpl, y, max_x))
        .collect();
    rows.into_iter().fold(None, better)
}
