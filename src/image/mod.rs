//! Frame and grayscale image containers.
//!
//! `Frame` is the owned 3-channel RGB image handed over by the frame source.
//! `OwnedImage` is a contiguous grayscale buffer and `ImageView` a borrowed
//! view into one; feature extraction and correlation only ever read views.

use crate::util::{IdentError, IdentResult};

#[cfg(feature = "image-io")]
pub mod io;
pub mod pyramid;

/// Borrowed 2D grayscale view with an explicit stride.
#[derive(Copy, Clone)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> IdentResult<Self> {
        let needed = checked_area(width, height)?;
        if data.len() < needed {
            return Err(IdentError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride: width,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the element at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.stride + x)
    }

    /// Returns a contiguous slice for row `y` with length `width`.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.stride;
        self.data.get(start..start + self.width)
    }
}

impl ImageView<'_, u8> {
    /// Reads a pixel with coordinates clamped to the image border.
    #[inline]
    pub(crate) fn at_clamped(&self, x: isize, y: isize) -> u8 {
        let cx = x.clamp(0, self.width as isize - 1) as usize;
        let cy = y.clamp(0, self.height as isize - 1) as usize;
        self.data[cy * self.stride + cx]
    }
}

/// Owned contiguous grayscale image buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl OwnedImage {
    /// Creates an image from a row-major buffer of exactly `width * height` bytes.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> IdentResult<Self> {
        let needed = checked_area(width, height)?;
        if data.len() != needed {
            return Err(IdentError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Wraps a buffer whose length is already known to be `width * height`.
    pub(crate) fn from_parts(data: Vec<u8>, width: usize, height: usize) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            data,
            width,
            height,
        }
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the raw row-major pixels.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns a borrowed view of the image.
    pub fn view(&self) -> ImageView<'_, u8> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }
}

/// Channel order of an interleaved 3-channel buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgb,
    Bgr,
}

/// Owned 8-bit RGB frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl Frame {
    /// Creates a frame from interleaved RGB bytes.
    pub fn from_rgb(data: Vec<u8>, width: usize, height: usize) -> IdentResult<Self> {
        Self::from_interleaved(data, width, height, ChannelOrder::Rgb)
    }

    /// Creates a frame from interleaved bytes in the given channel order.
    ///
    /// BGR input (the usual camera `bgr8` encoding) is swizzled to RGB.
    pub fn from_interleaved(
        mut data: Vec<u8>,
        width: usize,
        height: usize,
        order: ChannelOrder,
    ) -> IdentResult<Self> {
        let needed = checked_area(width, height)?
            .checked_mul(3)
            .ok_or(IdentError::InvalidDimensions { width, height })?;
        if data.len() != needed {
            return Err(IdentError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if order == ChannelOrder::Bgr {
            for px in data.chunks_exact_mut(3) {
                px.swap(0, 2);
            }
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Creates a frame filled with a single color.
    pub fn filled(width: usize, height: usize, rgb: [u8; 3]) -> IdentResult<Self> {
        let area = checked_area(width, height)?;
        let data = rgb.iter().copied().cycle().take(area * 3).collect();
        Self::from_rgb(data, width, height)
    }

    /// Returns the frame width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the frame height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the interleaved RGB bytes.
    pub fn as_rgb(&self) -> &[u8] {
        &self.data
    }

    /// Iterates over pixels as `[r, g, b]` in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        self.data.chunks_exact(3).map(|px| [px[0], px[1], px[2]])
    }

    /// Returns the pixel at `(x, y)` if it is within bounds.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) * 3;
        Some([self.data[idx], self.data[idx + 1], self.data[idx + 2]])
    }

    /// Overwrites the pixel at `(x, y)`; out-of-bounds writes are ignored.
    pub fn put_pixel(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y * self.width + x) * 3;
        self.data[idx..idx + 3].copy_from_slice(&rgb);
    }

    /// Fills an axis-aligned rectangle, clipped to the frame.
    pub fn fill_rect(&mut self, x0: usize, y0: usize, width: usize, height: usize, rgb: [u8; 3]) {
        let x1 = x0.saturating_add(width).min(self.width);
        let y1 = y0.saturating_add(height).min(self.height);
        for y in y0..y1 {
            for x in x0..x1 {
                self.put_pixel(x, y, rgb);
            }
        }
    }

    /// Converts to grayscale with BT.601 luma weights.
    pub fn to_gray(&self) -> OwnedImage {
        let data = self.pixels().map(|[r, g, b]| luma(r, g, b)).collect();
        OwnedImage {
            data,
            width: self.width,
            height: self.height,
        }
    }
}

/// Fixed-point BT.601 luma, `0.299 R + 0.587 G + 0.114 B` rounded.
#[inline]
pub(crate) fn luma(r: u8, g: u8, b: u8) -> u8 {
    const SHIFT: u32 = 14;
    let y = u32::from(r) * 4899 + u32::from(g) * 9617 + u32::from(b) * 1868 + (1 << (SHIFT - 1));
    (y >> SHIFT) as u8
}

fn checked_area(width: usize, height: usize) -> IdentResult<usize> {
    if width == 0 || height == 0 {
        return Err(IdentError::InvalidDimensions { width, height });
    }
    width
        .checked_mul(height)
        .ok_or(IdentError::InvalidDimensions { width, height })
}

#[cfg(test)]
mod tests {
    use super::luma;

    #[test]
    fn luma_matches_reference_weights() {
        assert_eq!(luma(0, 0, 0), 0);
        assert_eq!(luma(255, 255, 255), 255);
        assert_eq!(luma(255, 0, 0), 76);
        assert_eq!(luma(0, 255, 0), 150);
        assert_eq!(luma(0, 0, 255), 29);
    }
}
