//! Multi-scale template correlation.
//!
//! An alternative to feature matching: each template's thumbnail is slid
//! over progressively smaller copies of the grayscale frame and scored with
//! zero-mean normalized cross-correlation. The best placement at or above
//! [`CorrelationConfig::min_score`] across all templates and scales wins.

use crate::image::pyramid::resize_by;
use crate::image::ImageView;
use crate::template::TemplateStore;
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{IdentError, IdentResult};

mod plan;
mod scan;

pub use plan::ZnccPlan;
#[cfg(feature = "rayon")]
pub use scan::best_zncc_par;
pub use scan::{best_zncc, Peak};

/// Correlation search parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct CorrelationConfig {
    /// Frame scale percentages, tried in the given order.
    pub scales_pct: Vec<u32>,
    /// Minimum ZNCC score for a placement to be accepted.
    pub min_score: f32,
    /// Scan placement rows in parallel when the `rayon` feature is enabled.
    pub parallel: bool,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            scales_pct: (4..=10).rev().map(|step| step * 10).collect(),
            min_score: 0.8,
            parallel: false,
        }
    }
}

impl CorrelationConfig {
    /// Checks parameter ranges.
    pub fn validate(&self) -> IdentResult<()> {
        if self.scales_pct.is_empty() {
            return Err(IdentError::InvalidConfig("scales_pct must not be empty"));
        }
        if self.scales_pct.iter().any(|&pct| pct == 0 || pct > 100) {
            return Err(IdentError::InvalidConfig("scales_pct must be in 1..=100"));
        }
        if !self.min_score.is_finite() || self.min_score > 1.0 {
            return Err(IdentError::InvalidConfig("min_score must be at most 1"));
        }
        Ok(())
    }
}

/// Best accepted correlation hit.
#[derive(Clone, Debug, PartialEq)]
pub struct CorrelationMatch {
    /// Template name.
    pub name: String,
    /// ZNCC score of the placement.
    pub score: f32,
    /// Top-left corner in frame coordinates.
    pub x: f32,
    /// Top-left corner in frame coordinates.
    pub y: f32,
    /// Frame scale (fraction of 1) the hit was found at.
    pub scale: f32,
}

#[cfg(feature = "rayon")]
fn scan(image: ImageView<'_, u8>, plan: &ZnccPlan, parallel: bool) -> Option<Peak> {
    if parallel {
        best_zncc_par(image, plan)
    } else {
        best_zncc(image, plan)
    }
}

#[cfg(not(feature = "rayon"))]
fn scan(image: ImageView<'_, u8>, plan: &ZnccPlan, _parallel: bool) -> Option<Peak> {
    best_zncc(image, plan)
}

/// Finds the best template placement in a grayscale frame.
///
/// Templates without a usable thumbnail are skipped. Returns `None` when no
/// placement reaches the score threshold.
pub fn correlate(
    frame: ImageView<'_, u8>,
    store: &TemplateStore,
    cfg: &CorrelationConfig,
) -> Option<CorrelationMatch> {
    let _span = trace_span!(
        "correlate",
        templates = store.len(),
        scales = cfg.scales_pct.len()
    )
    .entered();

    let mut best: Option<CorrelationMatch> = None;
    for template in store.templates() {
        let Some(thumbnail) = template.thumbnail() else {
            trace_warn!("thumbnail_missing", template = template.name());
            continue;
        };
        let plan = match ZnccPlan::from_view(thumbnail.view()) {
            Ok(plan) => plan,
            Err(_) => {
                trace_warn!("thumbnail_degenerate", template = template.name());
                continue;
            }
        };

        for &pct in &cfg.scales_pct {
            let scale = pct as f32 / 100.0;
            let Some(resized) = resize_by(frame, scale) else {
                break;
            };
            if resized.width() < plan.width() || resized.height() < plan.height() {
                break;
            }
            let Some(peak) = scan(resized.view(), &plan, cfg.parallel) else {
                continue;
            };
            if peak.score < cfg.min_score {
                continue;
            }
            trace_event!(
                "correlation_hit",
                template = template.name(),
                score = peak.score,
                scale = scale
            );
            if best.as_ref().map_or(true, |b| peak.score > b.score) {
                best = Some(CorrelationMatch {
                    name: template.name().to_string(),
                    score: peak.score,
                    x: peak.x as f32 / scale,
                    y: peak.y as f32 / scale,
                    scale,
                });
            }
        }
    }
    best
}
