//! Hue-band color classification.
//!
//! Pixels are converted to the 8-bit HSV convention used by most camera
//! tooling (H in `[0, 180)`, S and V in `[0, 255]`). Each [`ColorBand`]
//! selects an inclusive HSV box and names the character it stands for; the
//! order of bands in [`ColorBands`] is the evaluation order of
//! [`ColorClassifier::classify`].

use crate::image::Frame;
use crate::trace::{trace_event, trace_span};
use crate::util::{IdentError, IdentResult};

pub mod region;

use region::largest_region_area;

/// Minimum region area (in pixels) a band must exceed to be reported.
pub const DEFAULT_MIN_REGION_AREA: usize = 300;

/// A pixel in 8-bit HSV.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

/// Converts an RGB pixel to 8-bit HSV.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let (rf, gf, bf) = (f32::from(r), f32::from(g), f32::from(b));
    let v = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let diff = v - min;

    let s = if v > 0.0 { diff * 255.0 / v } else { 0.0 };
    let mut h = if diff == 0.0 {
        0.0
    } else if v == rf {
        60.0 * (gf - bf) / diff
    } else if v == gf {
        120.0 + 60.0 * (bf - rf) / diff
    } else {
        240.0 + 60.0 * (rf - gf) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }
    let mut h = (h / 2.0).round() as u16;
    if h >= 180 {
        h -= 180;
    }

    Hsv {
        h: h as u8,
        s: s.round() as u8,
        v: v as u8,
    }
}

/// Inclusive HSV box. Bounds are signed so a hue interval may start below 0;
/// it does not wrap around to the top of the hue circle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HsvRange {
    pub lower: [i16; 3],
    pub upper: [i16; 3],
}

impl HsvRange {
    /// Builds a range centred on `hue` with the given half-width.
    pub fn around_hue(hue: i16, sensitivity: i16, min_sv: i16) -> Self {
        Self {
            lower: [hue - sensitivity, min_sv, min_sv],
            upper: [hue + sensitivity, 255, 255],
        }
    }

    /// Returns true when every channel lies within its bounds.
    #[inline]
    pub fn contains(&self, px: Hsv) -> bool {
        let values = [i16::from(px.h), i16::from(px.s), i16::from(px.v)];
        values
            .iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .all(|(&value, (&lo, &hi))| value >= lo && value <= hi)
    }
}

/// A named hue band and the character it identifies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorBand {
    pub name: String,
    pub range: HsvRange,
    pub character: String,
}

impl ColorBand {
    pub fn new(name: impl Into<String>, range: HsvRange, character: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            range,
            character: character.into(),
        }
    }
}

/// Position of a band within its [`ColorBands`] table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColorIndex(pub usize);

/// Ordered band table; each band maps to exactly one character.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorBands {
    bands: Vec<ColorBand>,
}

impl ColorBands {
    /// Validates and wraps a band table.
    ///
    /// Band names and character names must both be unique so the band to
    /// character mapping is a bijection.
    pub fn new(bands: Vec<ColorBand>) -> IdentResult<Self> {
        if bands.is_empty() {
            return Err(IdentError::InvalidConfig("at least one color band is required"));
        }
        for (i, band) in bands.iter().enumerate() {
            if band.character.is_empty() {
                return Err(IdentError::InvalidConfig("color band without character"));
            }
            for other in &bands[i + 1..] {
                if other.name == band.name {
                    return Err(IdentError::InvalidConfig("duplicate color band name"));
                }
                if other.character == band.character {
                    return Err(IdentError::InvalidConfig(
                        "two color bands map to the same character",
                    ));
                }
            }
        }
        Ok(Self { bands })
    }

    /// The four standard bands in evaluation order: red, cyan, magenta, yellow.
    pub fn standard() -> Self {
        Self {
            bands: vec![
                ColorBand::new("red", HsvRange::around_hue(0, 10, 100), "scarlet"),
                ColorBand::new("cyan", HsvRange::around_hue(90, 16, 100), "peacock"),
                ColorBand::new("magenta", HsvRange::around_hue(150, 16, 30), "plum"),
                ColorBand::new("yellow", HsvRange::around_hue(30, 12, 100), "mustard"),
            ],
        }
    }

    /// Returns the bands in evaluation order.
    pub fn bands(&self) -> &[ColorBand] {
        &self.bands
    }

    /// Returns the band at `index`.
    pub fn get(&self, index: ColorIndex) -> Option<&ColorBand> {
        self.bands.get(index.0)
    }

    /// Returns the character mapped to a band.
    pub fn character(&self, index: ColorIndex) -> Option<&str> {
        self.get(index).map(|band| band.character.as_str())
    }

    /// Iterates over character names in band order.
    pub fn characters(&self) -> impl Iterator<Item = &str> + '_ {
        self.bands.iter().map(|band| band.character.as_str())
    }

    /// Returns true when `name` is the character mapped to the detected color.
    ///
    /// An absent color never passes.
    pub fn cross_check(&self, color: Option<ColorIndex>, name: &str) -> bool {
        color
            .and_then(|index| self.character(index))
            .is_some_and(|character| character == name)
    }
}

impl Default for ColorBands {
    fn default() -> Self {
        Self::standard()
    }
}

/// Finds the first band, in table order, whose largest region is big enough.
#[derive(Clone, Debug)]
pub struct ColorClassifier {
    bands: ColorBands,
    min_area: usize,
}

impl ColorClassifier {
    pub fn new(bands: ColorBands, min_area: usize) -> Self {
        Self { bands, min_area }
    }

    /// Returns the band table.
    pub fn bands(&self) -> &ColorBands {
        &self.bands
    }

    /// Returns the area a region must exceed.
    pub fn min_area(&self) -> usize {
        self.min_area
    }

    /// Classifies the dominant band color of a frame.
    ///
    /// Bands are evaluated in table order and the first band whose largest
    /// 8-connected region is strictly larger than `min_area` wins, even if a
    /// later band has a larger region.
    pub fn classify(&self, frame: &Frame) -> Option<ColorIndex> {
        let _span = trace_span!("classify_color", bands = self.bands.bands.len()).entered();

        let hsv: Vec<Hsv> = frame.pixels().map(|[r, g, b]| rgb_to_hsv(r, g, b)).collect();
        for (idx, band) in self.bands.bands.iter().enumerate() {
            let mask: Vec<bool> = hsv.iter().map(|&px| band.range.contains(px)).collect();
            let Some(area) = largest_region_area(&mask, frame.width(), frame.height()) else {
                continue;
            };
            if area > self.min_area {
                trace_event!("color_detected", band = band.name.as_str(), area = area);
                return Some(ColorIndex(idx));
            }
        }
        None
    }

    /// Returns the largest region area of every band, in table order.
    pub fn region_areas(&self, frame: &Frame) -> Vec<usize> {
        let hsv: Vec<Hsv> = frame.pixels().map(|[r, g, b]| rgb_to_hsv(r, g, b)).collect();
        self.bands
            .bands
            .iter()
            .map(|band| {
                let mask: Vec<bool> = hsv.iter().map(|&px| band.range.contains(px)).collect();
                largest_region_area(&mask, frame.width(), frame.height()).unwrap_or(0)
            })
            .collect()
    }
}

impl Default for ColorClassifier {
    fn default() -> Self {
        Self::new(ColorBands::standard(), DEFAULT_MIN_REGION_AREA)
    }
}
