//! Reference template storage.
//!
//! A [`ReferenceTemplate`] is built once per character at startup: the
//! grayscale reference image, its ORB features, and a small thumbnail for the
//! correlation strategy. [`TemplateStore`] keeps templates sorted by name so
//! iteration order, and therefore tie-breaking, is stable.

use crate::color::ColorBands;
use crate::features::{Features, OrbDetector};
use crate::image::pyramid::resize_by;
use crate::image::OwnedImage;
use crate::trace::{trace_error, trace_event};

#[cfg(feature = "image-io")]
mod load;

#[cfg(feature = "image-io")]
pub use load::load_template_dir;

/// Default thumbnail scale used by the correlation strategy.
pub const DEFAULT_THUMBNAIL_SCALE: f32 = 0.10;

/// Number of characters a complete store holds.
pub const EXPECTED_TEMPLATES: usize = 4;

/// Immutable reference record for one character.
#[derive(Clone, Debug)]
pub struct ReferenceTemplate {
    name: String,
    features: Features,
    image: OwnedImage,
    thumbnail: Option<OwnedImage>,
}

impl ReferenceTemplate {
    /// Precomputes features and the thumbnail for a grayscale reference image.
    pub fn build(
        name: impl Into<String>,
        image: OwnedImage,
        detector: &OrbDetector,
        thumbnail_scale: f32,
    ) -> Self {
        let name = name.into();
        let features = detector.detect_and_compute(image.view());
        let thumbnail = resize_by(image.view(), thumbnail_scale);
        trace_event!(
            "template_built",
            template = name.as_str(),
            keypoints = features.len()
        );
        Self {
            name,
            features,
            image,
            thumbnail,
        }
    }

    /// Character name of this template.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Precomputed keypoints and descriptors.
    pub fn features(&self) -> &Features {
        &self.features
    }

    /// Number of keypoints detected on the reference image.
    pub fn keypoint_count(&self) -> usize {
        self.features.len()
    }

    /// The full-resolution grayscale reference image.
    pub fn image(&self) -> &OwnedImage {
        &self.image
    }

    /// Downscaled image used for correlation, absent if the scale collapsed it.
    pub fn thumbnail(&self) -> Option<&OwnedImage> {
        self.thumbnail.as_ref()
    }
}

/// Name-sorted collection of reference templates.
#[derive(Clone, Debug, Default)]
pub struct TemplateStore {
    templates: Vec<ReferenceTemplate>,
}

impl TemplateStore {
    /// Builds a store from named grayscale images.
    ///
    /// Later duplicates of a name are dropped. A store with other than
    /// [`EXPECTED_TEMPLATES`] entries is logged as an error but still returned.
    pub fn build(
        images: Vec<(String, OwnedImage)>,
        detector: &OrbDetector,
        thumbnail_scale: f32,
    ) -> Self {
        let templates = images
            .into_iter()
            .map(|(name, image)| ReferenceTemplate::build(name, image, detector, thumbnail_scale))
            .collect();
        Self::from_templates(templates)
    }

    /// Wraps prebuilt templates, sorting them by name.
    pub fn from_templates(mut templates: Vec<ReferenceTemplate>) -> Self {
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        templates.dedup_by(|later, earlier| later.name == earlier.name);

        if templates.len() != EXPECTED_TEMPLATES {
            let names = templates
                .iter()
                .map(|t| t.name.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            trace_error!(
                "incomplete_template_store",
                found = templates.len(),
                expected = EXPECTED_TEMPLATES,
                names = names.as_str()
            );
        } else {
            trace_event!("template_store_ready", templates = templates.len());
        }
        Self { templates }
    }

    /// Templates in name order.
    pub fn templates(&self) -> &[ReferenceTemplate] {
        &self.templates
    }

    /// Looks up a template by name.
    pub fn get(&self, name: &str) -> Option<&ReferenceTemplate> {
        self.templates
            .binary_search_by(|t| t.name.as_str().cmp(name))
            .ok()
            .map(|idx| &self.templates[idx])
    }

    /// Template names in store order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.templates.iter().map(|t| t.name.as_str())
    }

    /// Characters of the band table that have no template.
    pub fn missing_characters<'a>(&self, bands: &'a ColorBands) -> Vec<&'a str> {
        bands
            .characters()
            .filter(|character| self.get(character).is_none())
            .collect()
    }

    /// Number of templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns true when the store is empty.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
