//! Nearest-neighbour descriptor matching with the ratio test.
//!
//! For every frame descriptor the two closest template descriptors are found
//! by exhaustive Hamming search. The pairing counts as a good match only when
//! `nearest < ratio * second` holds strictly.

use crate::features::{Descriptor, Features};
use crate::template::TemplateStore;
use crate::trace::{trace_event, trace_span};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Default ratio-test threshold.
pub const DEFAULT_RATIO: f32 = 0.80;

/// Good-match count for one template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchResult {
    pub template_name: String,
    pub good_matches: usize,
}

/// The two nearest neighbours of a query descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NeighborPair {
    /// Index and distance of the closest train descriptor.
    pub nearest: (usize, u32),
    /// Index and distance of the runner-up.
    pub second: (usize, u32),
}

/// Finds the two nearest train descriptors for `query`.
///
/// Returns `None` when fewer than two train descriptors exist. Ties keep the
/// lower train index first.
pub fn knn2(query: &Descriptor, train: &[Descriptor]) -> Option<NeighborPair> {
    if train.len() < 2 {
        return None;
    }
    let mut best = (usize::MAX, u32::MAX);
    let mut second = (usize::MAX, u32::MAX);
    for (idx, candidate) in train.iter().enumerate() {
        let distance = query.hamming(candidate);
        if distance < best.1 {
            second = best;
            best = (idx, distance);
        } else if distance < second.1 {
            second = (idx, distance);
        }
    }
    Some(NeighborPair {
        nearest: best,
        second,
    })
}

/// Lowe's ratio test; equality is rejected.
#[inline]
pub fn passes_ratio_test(nearest: u32, second: u32, ratio: f32) -> bool {
    (nearest as f32) < ratio * second as f32
}

/// Counts query descriptors whose nearest train neighbour passes the ratio test.
pub fn count_good_matches(query: &[Descriptor], train: &[Descriptor], ratio: f32) -> usize {
    query
        .iter()
        .filter_map(|q| knn2(q, train))
        .filter(|pair| passes_ratio_test(pair.nearest.1, pair.second.1, ratio))
        .count()
}

/// Scores frame features against every template of a store.
#[derive(Clone, Copy, Debug)]
pub struct FeatureMatcher {
    ratio: f32,
    parallel: bool,
}

impl FeatureMatcher {
    pub fn new(ratio: f32) -> Self {
        Self {
            ratio,
            parallel: false,
        }
    }

    /// Matches templates in parallel when the `rayon` feature is enabled.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Returns the ratio-test threshold.
    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// Produces one [`MatchResult`] per template, in store order.
    pub fn match_store(&self, frame: &Features, store: &TemplateStore) -> Vec<MatchResult> {
        let _span = trace_span!(
            "match_templates",
            templates = store.len(),
            frame_keypoints = frame.len()
        )
        .entered();

        let score = |template: &crate::template::ReferenceTemplate| MatchResult {
            template_name: template.name().to_string(),
            good_matches: count_good_matches(
                &frame.descriptors,
                &template.features().descriptors,
                self.ratio,
            ),
        };

        #[cfg(feature = "rayon")]
        let results: Vec<MatchResult> = if self.parallel {
            store.templates().par_iter().map(score).collect()
        } else {
            store.templates().iter().map(score).collect()
        };
        #[cfg(not(feature = "rayon"))]
        let results: Vec<MatchResult> = store.templates().iter().map(score).collect();

        for result in &results {
            trace_event!(
                "template_matches",
                template = result.template_name.as_str(),
                good_matches = result.good_matches
            );
        }
        results
    }
}

impl Default for FeatureMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_RATIO)
    }
}
