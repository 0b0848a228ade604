//! Convenience helpers for loading and saving images via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::{Frame, OwnedImage};
use crate::util::{IdentError, IdentResult};
use std::path::Path;

/// Creates a frame from an RGB image buffer.
pub fn frame_from_rgb_image(img: &image::RgbImage) -> IdentResult<Frame> {
    Frame::from_rgb(
        img.as_raw().clone(),
        img.width() as usize,
        img.height() as usize,
    )
}

/// Creates an owned grayscale image from a luma buffer.
pub fn owned_from_gray_image(img: &image::GrayImage) -> IdentResult<OwnedImage> {
    OwnedImage::new(
        img.as_raw().clone(),
        img.width() as usize,
        img.height() as usize,
    )
}

/// Loads an image from disk as an RGB frame.
pub fn load_frame<P: AsRef<Path>>(path: P) -> IdentResult<Frame> {
    let img = image::open(path).map_err(|err| IdentError::ImageIo {
        reason: err.to_string(),
    })?;
    frame_from_rgb_image(&img.to_rgb8())
}

/// Loads an image from disk and converts it to grayscale.
pub fn load_gray_image<P: AsRef<Path>>(path: P) -> IdentResult<OwnedImage> {
    let img = image::open(path).map_err(|err| IdentError::ImageIo {
        reason: err.to_string(),
    })?;
    owned_from_gray_image(&img.to_luma8())
}

/// Writes a frame to disk; the format follows the file extension.
pub fn save_frame<P: AsRef<Path>>(frame: &Frame, path: P) -> IdentResult<()> {
    let img = image::RgbImage::from_raw(
        frame.width() as u32,
        frame.height() as u32,
        frame.as_rgb().to_vec(),
    )
    .ok_or(IdentError::BufferTooSmall {
        needed: frame.width() * frame.height() * 3,
        got: frame.as_rgb().len(),
    })?;
    img.save(path).map_err(|err| IdentError::ImageIo {
        reason: err.to_string(),
    })
}
