//! Identification controller and the trigger-driven service around it.
//!
//! [`Identifier`] owns the immutable template store and runs one pass of
//! color classification, feature matching and selection per call.
//! [`IdentifyService`] adds the frame mailbox and the detection sink.

use crate::color::{ColorBands, ColorClassifier, ColorIndex, DEFAULT_MIN_REGION_AREA};
use crate::correlate::{correlate, CorrelationConfig, CorrelationMatch};
use crate::features::{OrbConfig, OrbDetector};
use crate::image::{Frame, OwnedImage};
use crate::matching::{FeatureMatcher, MatchResult, DEFAULT_RATIO};
use crate::select::{select, FailureCause, Selection, Verdict, DEFAULT_MIN_MATCHES};
use crate::template::{TemplateStore, DEFAULT_THUMBNAIL_SCALE};
use crate::trace::{trace_error, trace_event, trace_span};
use crate::util::{IdentError, IdentResult};

mod sink;
mod source;

#[cfg(feature = "image-io")]
pub use sink::FileSink;
pub use sink::{DetectionSink, MemorySink};
pub use source::{FrameSlot, FrameSource};

/// Identification parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct IdentifyConfig {
    /// Ratio-test threshold.
    pub ratio: f32,
    /// Minimum good matches for a candidate.
    pub min_matches: usize,
    /// A color region must be strictly larger than this many pixels.
    pub min_region_area: usize,
    pub orb: OrbConfig,
    pub bands: ColorBands,
    pub correlation: CorrelationConfig,
    /// Thumbnail scale for the correlation strategy.
    pub thumbnail_scale: f32,
    /// Run per-template matching and correlation rows in parallel
    /// (`rayon` feature). Overrides `correlation.parallel`.
    pub parallel: bool,
}

impl Default for IdentifyConfig {
    fn default() -> Self {
        Self {
            ratio: DEFAULT_RATIO,
            min_matches: DEFAULT_MIN_MATCHES,
            min_region_area: DEFAULT_MIN_REGION_AREA,
            orb: OrbConfig::default(),
            bands: ColorBands::standard(),
            correlation: CorrelationConfig::default(),
            thumbnail_scale: DEFAULT_THUMBNAIL_SCALE,
            parallel: false,
        }
    }
}

impl IdentifyConfig {
    pub fn validate(&self) -> IdentResult<()> {
        if !(self.ratio > 0.0 && self.ratio <= 1.0) {
            return Err(IdentError::InvalidConfig("ratio must be in (0, 1]"));
        }
        if self.min_matches == 0 {
            return Err(IdentError::InvalidConfig("min_matches must be at least 1"));
        }
        if !(self.thumbnail_scale > 0.0 && self.thumbnail_scale <= 1.0) {
            return Err(IdentError::InvalidConfig("thumbnail_scale must be in (0, 1]"));
        }
        self.orb.validate()?;
        self.correlation.validate()
    }
}

/// Everything one identification produced.
#[derive(Clone, Debug, PartialEq)]
pub struct Identification {
    pub verdict: Verdict,
    /// Detected band, if any.
    pub color: Option<ColorIndex>,
    /// Per-template good-match counts in store order.
    pub results: Vec<MatchResult>,
    pub cause: Option<FailureCause>,
}

impl Identification {
    fn no_frame() -> Self {
        trace_error!(
            "identification_failed",
            cause = FailureCause::NoFrame.as_str(),
            message = FailureCause::NoFrame.message()
        );
        let Selection { verdict, cause } = Selection::failure(FailureCause::NoFrame);
        Self {
            verdict,
            color: None,
            results: Vec::new(),
            cause,
        }
    }
}

/// Stateless identifier over an immutable template store.
#[derive(Clone, Debug)]
pub struct Identifier {
    store: TemplateStore,
    detector: OrbDetector,
    classifier: ColorClassifier,
    matcher: FeatureMatcher,
    cfg: IdentifyConfig,
}

impl Identifier {
    /// Wraps a prebuilt store. Characters without a template are logged;
    /// they can never be identified.
    pub fn new(store: TemplateStore, mut cfg: IdentifyConfig) -> IdentResult<Self> {
        cfg.validate()?;
        cfg.correlation.parallel = cfg.parallel;

        for character in store.missing_characters(&cfg.bands) {
            trace_error!("template_missing", character = character);
        }

        Ok(Self {
            detector: OrbDetector::new(cfg.orb.clone())?,
            classifier: ColorClassifier::new(cfg.bands.clone(), cfg.min_region_area),
            matcher: FeatureMatcher::new(cfg.ratio).with_parallel(cfg.parallel),
            store,
            cfg,
        })
    }

    /// Builds the store from named grayscale images, then the identifier.
    pub fn from_images(images: Vec<(String, OwnedImage)>, cfg: IdentifyConfig) -> IdentResult<Self> {
        cfg.validate()?;
        let detector = OrbDetector::new(cfg.orb.clone())?;
        let store = TemplateStore::build(images, &detector, cfg.thumbnail_scale);
        Self::new(store, cfg)
    }

    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    pub fn bands(&self) -> &ColorBands {
        &self.cfg.bands
    }

    pub fn detector(&self) -> &OrbDetector {
        &self.detector
    }

    pub fn config(&self) -> &IdentifyConfig {
        &self.cfg
    }

    pub fn identify(&self, frame: &Frame) -> Verdict {
        self.identify_detailed(frame).verdict
    }

    /// Runs classification, matching and selection, keeping intermediates.
    pub fn identify_detailed(&self, frame: &Frame) -> Identification {
        let _span = trace_span!(
            "identify",
            width = frame.width(),
            height = frame.height()
        )
        .entered();

        let color = self.classifier.classify(frame);
        let gray = frame.to_gray();
        let features = self.detector.detect_and_compute(gray.view());
        let results = self.matcher.match_store(&features, &self.store);
        let Selection { verdict, cause } =
            select(color, &self.cfg.bands, &results, self.cfg.min_matches);

        Identification {
            verdict,
            color,
            results,
            cause,
        }
    }

    /// Identifies the source's current frame; an absent frame fails.
    pub fn identify_current(&self, source: &impl FrameSource) -> Verdict {
        self.identify_current_detailed(source).verdict
    }

    pub fn identify_current_detailed(&self, source: &impl FrameSource) -> Identification {
        match source.current_frame() {
            Some(frame) => self.identify_detailed(&frame),
            None => Identification::no_frame(),
        }
    }

    /// Best multi-scale correlation hit across all templates.
    pub fn correlate(&self, frame: &Frame) -> Option<CorrelationMatch> {
        let gray = frame.to_gray();
        correlate(gray.view(), &self.store, &self.cfg.correlation)
    }

    /// Identifies by template correlation alone, without the color check.
    pub fn identify_by_correlation(&self, frame: &Frame) -> Verdict {
        match self.correlate(frame) {
            Some(hit) => {
                trace_event!(
                    "character_identified",
                    character = hit.name.as_str(),
                    score = hit.score
                );
                Verdict::matched(hit.name)
            }
            None => {
                trace_error!(
                    "identification_failed",
                    cause = FailureCause::NoCandidate.as_str(),
                    message = FailureCause::NoCandidate.message()
                );
                Verdict::no_match()
            }
        }
    }
}

/// Trigger-driven identification: snapshot, identify, record.
#[derive(Debug)]
pub struct IdentifyService<S, K> {
    identifier: Identifier,
    source: S,
    sink: K,
}

impl<S: FrameSource, K: DetectionSink> IdentifyService<S, K> {
    pub fn new(identifier: Identifier, source: S, sink: K) -> Self {
        Self {
            identifier,
            source,
            sink,
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Runs one identification and returns whether it succeeded.
    ///
    /// A failure to record the detection is logged but does not change the
    /// result.
    pub fn trigger(&self) -> bool {
        self.trigger_detailed().verdict.matched
    }

    pub fn trigger_detailed(&self) -> Identification {
        let Some(frame) = self.source.current_frame() else {
            return Identification::no_frame();
        };
        let identification = self.identifier.identify_detailed(&frame);
        if let Some(character) = &identification.verdict.character {
            if let Err(err) = self.sink.record(&frame, character) {
                trace_error!(
                    "detection_not_saved",
                    character = character.as_str(),
                    error = err.to_string().as_str()
                );
            }
        }
        identification
    }
}
