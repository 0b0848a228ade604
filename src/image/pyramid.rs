//! Scale pyramid construction for grayscale `u8` images.
//!
//! Each level is produced from the previous one by bilinear resampling with
//! pixel-center alignment: `src = (dst + 0.5) * factor - 0.5`, clamped to the
//! source border.

use crate::image::{ImageView, OwnedImage};

/// Resizes a grayscale view to `dst_width x dst_height` with bilinear filtering.
///
/// Returns `None` when either target dimension is zero.
pub fn resize_bilinear(
    src: ImageView<'_, u8>,
    dst_width: usize,
    dst_height: usize,
) -> Option<OwnedImage> {
    if dst_width == 0 || dst_height == 0 {
        return None;
    }
    let fx = src.width() as f32 / dst_width as f32;
    let fy = src.height() as f32 / dst_height as f32;
    let max_x = src.width() as f32 - 1.0;
    let max_y = src.height() as f32 - 1.0;

    let mut data = Vec::with_capacity(dst_width * dst_height);
    for y in 0..dst_height {
        let sy = ((y as f32 + 0.5) * fy - 0.5).clamp(0.0, max_y);
        let y0 = sy.floor() as isize;
        let wy = sy - y0 as f32;
        for x in 0..dst_width {
            let sx = ((x as f32 + 0.5) * fx - 0.5).clamp(0.0, max_x);
            let x0 = sx.floor() as isize;
            let wx = sx - x0 as f32;

            let a = src.at_clamped(x0, y0) as f32;
            let b = src.at_clamped(x0 + 1, y0) as f32;
            let c = src.at_clamped(x0, y0 + 1) as f32;
            let d = src.at_clamped(x0 + 1, y0 + 1) as f32;
            let top = a + (b - a) * wx;
            let bottom = c + (d - c) * wx;
            let value = top + (bottom - top) * wy;
            data.push(value.round().clamp(0.0, 255.0) as u8);
        }
    }
    OwnedImage::new(data, dst_width, dst_height).ok()
}

/// Resizes by a uniform scale factor (`scale < 1` shrinks).
pub fn resize_by(src: ImageView<'_, u8>, scale: f32) -> Option<OwnedImage> {
    let width = (src.width() as f32 * scale).round() as usize;
    let height = (src.height() as f32 * scale).round() as usize;
    resize_bilinear(src, width, height)
}

/// One pyramid level with its scale relative to the base image.
pub struct PyramidLevel {
    /// Level image.
    pub image: OwnedImage,
    /// Multiply level coordinates by this to get base coordinates.
    pub scale: f32,
}

/// Owned scale pyramid built from a base level.
pub struct ScalePyramid {
    levels: Vec<PyramidLevel>,
}

impl ScalePyramid {
    /// Builds up to `max_levels` levels, each `scale_factor` times smaller.
    ///
    /// Construction stops early once a level would be smaller than
    /// `min_side` in either dimension. The base level is always present.
    pub fn build(
        base: ImageView<'_, u8>,
        max_levels: usize,
        scale_factor: f32,
        min_side: usize,
    ) -> Self {
        let mut levels = Vec::with_capacity(max_levels.max(1));
        let base_img = OwnedImage {
            data: (0..base.height())
                .filter_map(|y| base.row(y))
                .flatten()
                .copied()
                .collect(),
            width: base.width(),
            height: base.height(),
        };
        levels.push(PyramidLevel {
            image: base_img,
            scale: 1.0,
        });

        while levels.len() < max_levels {
            let Some(prev) = levels.last() else { break };
            let width = (prev.image.width() as f32 / scale_factor).round() as usize;
            let height = (prev.image.height() as f32 / scale_factor).round() as usize;
            if width < min_side || height < min_side {
                break;
            }
            let scale = prev.scale * scale_factor;
            let Some(image) = resize_bilinear(prev.image.view(), width, height) else {
                break;
            };
            levels.push(PyramidLevel { image, scale });
        }

        Self { levels }
    }

    /// Returns all pyramid levels (level 0 is the base resolution).
    pub fn levels(&self) -> &[PyramidLevel] {
        &self.levels
    }

    /// Returns the number of levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Returns true if the pyramid holds no levels.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_keeps_flat_images_flat() {
        let img = OwnedImage::new(vec![77u8; 40 * 30], 40, 30).unwrap();
        let small = resize_bilinear(img.view(), 13, 7).unwrap();
        assert_eq!(small.width(), 13);
        assert_eq!(small.height(), 7);
        assert!(small.data().iter().all(|&v| v == 77));
    }

    #[test]
    fn pyramid_stops_at_min_side() {
        let img = OwnedImage::new(vec![0u8; 100 * 100], 100, 100).unwrap();
        let pyramid = ScalePyramid::build(img.view(), 8, 2.0, 20);
        let sides: Vec<_> = pyramid.levels().iter().map(|l| l.image.width()).collect();
        assert_eq!(sides, vec![100, 50, 25]);
        assert!((pyramid.levels()[2].scale - 4.0).abs() < 1e-6);
    }
}
