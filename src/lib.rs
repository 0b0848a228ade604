//! cluedoid identifies which of four known character cards is visible in a
//! camera frame.
//!
//! A frame is classified by its dominant hue band, matched against reference
//! templates with ORB-style binary features, and the best feature candidate is
//! accepted only when it agrees with the detected color. A multi-scale ZNCC
//! correlation strategy is available as an alternative. Per-template matching
//! can run in parallel via the `rayon` feature; `image-io` adds file loading
//! and the file-backed detection sink.

pub mod color;
pub mod correlate;
pub mod features;
pub mod identify;
pub mod image;
pub mod matching;
pub mod select;
pub mod template;
mod trace;
pub mod util;

pub use color::{ColorBand, ColorBands, ColorClassifier, ColorIndex, HsvRange};
pub use correlate::{CorrelationConfig, CorrelationMatch};
pub use features::{Descriptor, Features, Keypoint, OrbConfig, OrbDetector};
#[cfg(feature = "image-io")]
pub use identify::FileSink;
pub use identify::{
    DetectionSink, FrameSlot, FrameSource, Identification, IdentifyConfig, IdentifyService,
    Identifier, MemorySink,
};
pub use image::{ChannelOrder, Frame, ImageView, OwnedImage};
pub use matching::{FeatureMatcher, MatchResult};
pub use select::{select, FailureCause, Selection, Verdict};
#[cfg(feature = "image-io")]
pub use template::load_template_dir;
pub use template::{ReferenceTemplate, TemplateStore};
pub use util::{IdentError, IdentResult};
