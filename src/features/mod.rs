//! ORB-style keypoints and binary descriptors.
//!
//! Detection runs on a scale pyramid: FAST-9 corners per level, ranked by
//! Harris response and capped by a per-level quota proportional to the level
//! area; each survivor gets an intensity-centroid orientation and a steered
//! 256-bit BRIEF descriptor. Keypoints are reported in base-level coordinates.

use crate::image::pyramid::ScalePyramid;
use crate::image::ImageView;
use crate::trace::{trace_event, trace_span};
use crate::util::{IdentError, IdentResult};

mod brief;
mod fast;

/// Descriptor length in bytes (256 bits).
pub const DESCRIPTOR_BYTES: usize = 32;

/// 256-bit binary descriptor compared by Hamming distance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Descriptor(pub [u8; DESCRIPTOR_BYTES]);

impl Descriptor {
    /// Number of differing bits.
    #[inline]
    pub fn hamming(&self, other: &Descriptor) -> u32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }
}

/// An oriented keypoint in base-level image coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Orientation in radians.
    pub angle: f32,
    /// Harris response at the detection level.
    pub response: f32,
    /// Pyramid level the keypoint was found on.
    pub octave: usize,
    /// Patch diameter in base-level pixels.
    pub size: f32,
}

/// Keypoints and their descriptors, index-aligned.
#[derive(Clone, Debug, Default)]
pub struct Features {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Descriptor>,
}

impl Features {
    /// Number of keypoints.
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    /// Returns true when nothing was detected.
    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

/// Detector parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct OrbConfig {
    /// Upper bound on keypoints across all levels.
    pub max_features: usize,
    /// Downscale factor between consecutive pyramid levels.
    pub scale_factor: f32,
    /// Maximum number of pyramid levels.
    pub levels: usize,
    /// FAST intensity threshold.
    pub fast_threshold: u8,
    /// Keypoints closer than this to a level border are discarded.
    pub edge_threshold: usize,
    /// Patch diameter used to report keypoint size.
    pub patch_size: usize,
    /// Harris window size.
    pub harris_block: usize,
    /// Harris sensitivity.
    pub harris_k: f64,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            max_features: 500,
            scale_factor: 1.2,
            levels: 8,
            fast_threshold: 20,
            edge_threshold: 31,
            patch_size: 31,
            harris_block: 7,
            harris_k: 0.04,
        }
    }
}

impl OrbConfig {
    /// Checks parameter ranges.
    pub fn validate(&self) -> IdentResult<()> {
        if self.max_features == 0 {
            return Err(IdentError::InvalidConfig("max_features must be at least 1"));
        }
        if self.scale_factor.is_nan() || self.scale_factor <= 1.0 {
            return Err(IdentError::InvalidConfig("scale_factor must be greater than 1"));
        }
        if self.levels == 0 {
            return Err(IdentError::InvalidConfig("levels must be at least 1"));
        }
        if self.harris_block == 0 || self.harris_block % 2 == 0 {
            return Err(IdentError::InvalidConfig("harris_block must be odd"));
        }
        Ok(())
    }
}

/// ORB-style keypoint detector and descriptor extractor.
#[derive(Clone, Debug)]
pub struct OrbDetector {
    cfg: OrbConfig,
}

impl OrbDetector {
    /// Creates a detector after validating the configuration.
    pub fn new(cfg: OrbConfig) -> IdentResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    /// Returns the detector configuration.
    pub fn config(&self) -> &OrbConfig {
        &self.cfg
    }

    /// Detects keypoints and computes descriptors on a grayscale image.
    ///
    /// Images too small for the edge threshold yield no features.
    pub fn detect_and_compute(&self, image: ImageView<'_, u8>) -> Features {
        let _span = trace_span!(
            "detect_and_compute",
            width = image.width(),
            height = image.height()
        )
        .entered();

        let cfg = &self.cfg;
        let min_side = 2 * cfg.edge_threshold + 1;
        let pyramid = ScalePyramid::build(image, cfg.levels, cfg.scale_factor, min_side);
        let quotas = level_quotas(cfg.max_features, cfg.scale_factor, pyramid.len());

        let mut features = Features::default();
        for (octave, (level, &quota)) in pyramid.levels().iter().zip(quotas.iter()).enumerate() {
            if quota == 0 {
                continue;
            }
            let view = level.image.view();
            let mut ranked: Vec<(usize, usize, f64)> =
                fast::detect(view, cfg.fast_threshold, cfg.edge_threshold)
                    .into_iter()
                    .map(|c| {
                        let response =
                            fast::harris_response(view, c.x, c.y, cfg.harris_block, cfg.harris_k);
                        (c.x, c.y, response)
                    })
                    .collect();
            ranked.sort_by(|a, b| {
                b.2.total_cmp(&a.2)
                    .then_with(|| a.1.cmp(&b.1))
                    .then_with(|| a.0.cmp(&b.0))
            });
            ranked.truncate(quota);
            if ranked.is_empty() {
                continue;
            }

            let smoothed = brief::smooth(view);
            for (x, y, response) in ranked {
                let angle = brief::orientation(view, x, y);
                let descriptor = brief::describe(smoothed.view(), x, y, angle);
                features.keypoints.push(Keypoint {
                    x: x as f32 * level.scale,
                    y: y as f32 * level.scale,
                    angle,
                    response: response as f32,
                    octave,
                    size: cfg.patch_size as f32 * level.scale,
                });
                features.descriptors.push(descriptor);
            }
        }

        trace_event!(
            "features_detected",
            keypoints = features.len(),
            levels = pyramid.len()
        );
        features
    }
}

impl Default for OrbDetector {
    fn default() -> Self {
        Self {
            cfg: OrbConfig::default(),
        }
    }
}

/// Splits `total` across `levels` as a geometric series in `1 / scale_factor`,
/// giving the remainder to the coarsest level.
fn level_quotas(total: usize, scale_factor: f32, levels: usize) -> Vec<usize> {
    if levels == 0 {
        return Vec::new();
    }
    let factor = 1.0 / scale_factor;
    let mut desired = total as f32 * (1.0 - factor) / (1.0 - factor.powi(levels as i32));
    let mut quotas = Vec::with_capacity(levels);
    let mut assigned = 0usize;
    for _ in 0..levels - 1 {
        let quota = (desired.round() as usize).min(total - assigned);
        quotas.push(quota);
        assigned += quota;
        desired *= factor;
    }
    quotas.push(total - assigned);
    quotas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hamming_counts_bits() {
        let a = Descriptor([0u8; DESCRIPTOR_BYTES]);
        let mut bytes = [0u8; DESCRIPTOR_BYTES];
        bytes[0] = 0b1010_0001;
        bytes[31] = 0xFF;
        let b = Descriptor(bytes);
        assert_eq!(a.hamming(&b), 11);
        assert_eq!(b.hamming(&b), 0);
    }

    #[test]
    fn quotas_sum_to_total_and_decrease() {
        let quotas = level_quotas(500, 1.2, 8);
        assert_eq!(quotas.len(), 8);
        assert_eq!(quotas.iter().sum::<usize>(), 500);
        assert!(quotas[0] > quotas[1]);
        assert_eq!(level_quotas(10, 1.2, 1), vec![10]);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = OrbConfig {
            scale_factor: 1.0,
            ..OrbConfig::default()
        };
        assert_eq!(
            OrbDetector::new(cfg).unwrap_err(),
            IdentError::InvalidConfig("scale_factor must be greater than 1")
        );
    }
}
