//! Pixel storage shared by every engine operation.
//!
//! ## Layout
//!
//! A [`PixelBuffer`] is a flat run of RGBA8 bytes, row-major, top row first:
//!
//! | Offset | Content |
//! |--------|---------|
//! | `(y * width + x) * 4 + 0` | red |
//! | `(y * width + x) * 4 + 1` | green |
//! | `(y * width + x) * 4 + 2` | blue |
//! | `(y * width + x) * 4 + 3` | alpha |
//!
//! Filter kernels see the same bytes as an `ndarray` view of shape
//! (height, width, 4).

use std::fmt;
use std::str::FromStr;

use ndarray::{Array3, ArrayView3};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Bytes per RGBA pixel.
pub const CHANNELS: usize = 4;

/// Owned RGBA8 image. `data.len() == width * height * 4` always holds.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Fully transparent black image.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let len = byte_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0; len],
        })
    }

    /// Wrap raw RGBA bytes, checking the length against the dimensions.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        if data.len() % CHANNELS != 0 {
            return Err(EngineError::UnalignedBuffer { len: data.len() });
        }
        let expected = byte_len(width, height)?;
        if data.len() != expected {
            return Err(EngineError::DimensionMismatch {
                width,
                height,
                len: data.len(),
                expected,
            });
        }
        Ok(Self { width, height, data })
    }

    /// Build from a list of RGBA pixels in row-major order.
    pub fn from_pixels(width: u32, height: u32, pixels: &[[u8; 4]]) -> Result<Self> {
        let data = pixels.iter().flatten().copied().collect();
        Self::from_raw(width, height, data)
    }

    /// Take ownership of a (height, width, 4) array produced by a filter kernel.
    pub fn from_array(array: Array3<u8>) -> Result<Self> {
        let (height, width, channels) = array.dim();
        if channels != CHANNELS {
            return Err(EngineError::DimensionMismatch {
                width: width as u32,
                height: height as u32,
                len: array.len(),
                expected: width * height * CHANNELS,
            });
        }
        let array = if array.is_standard_layout() {
            array
        } else {
            array.as_standard_layout().into_owned()
        };
        let (data, _) = array.into_raw_vec_and_offset();
        Self::from_raw(width as u32, height as u32, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// View as a (height, width, 4) array for the filter kernels.
    pub fn view(&self) -> Result<ArrayView3<'_, u8>> {
        let shape = (self.height as usize, self.width as usize, CHANNELS);
        Ok(ArrayView3::from_shape(shape, &self.data)?)
    }

    /// RGBA value at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * CHANNELS;
        let px = &self.data[idx..idx + CHANNELS];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Iterator over the alpha channel, row-major.
    pub fn alphas(&self) -> impl Iterator<Item = u8> + '_ {
        self.data.chunks_exact(CHANNELS).map(|px| px[3])
    }
}

/// `width * height * 4`, or [`EngineError::TooLarge`] when it overflows `usize`.
fn byte_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(CHANNELS))
        .ok_or(EngineError::TooLarge { width, height })
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Opaque RGB reference color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const BLACK: Color = Color::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Color of a sampled pixel, alpha dropped.
    pub fn from_pixel(px: [u8; 4]) -> Self {
        Self::new(px[0], px[1], px[2])
    }

    /// Parse `#rrggbb` or `rrggbb`.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(EngineError::InvalidColor(hex.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| EngineError::InvalidColor(hex.to_string()))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Largest per-channel difference still counted as a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tolerance(pub u32);

impl Tolerance {
    pub const EXACT: Tolerance = Tolerance(0);

    /// True when every RGB channel of `px` lies within the tolerance of `reference`.
    #[inline]
    pub fn matches(self, px: [u8; 4], reference: Color) -> bool {
        let tol = self.0.min(255) as i32;
        let dr = (px[0] as i32 - reference.r as i32).abs();
        let dg = (px[1] as i32 - reference.g as i32).abs();
        let db = (px[2] as i32 - reference.b as i32).abs();
        dr <= tol && dg <= tol && db <= tol
    }
}

impl From<u32> for Tolerance {
    fn from(value: u32) -> Self {
        Tolerance(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_rejects_unaligned() {
        let err = PixelBuffer::from_raw(1, 1, vec![0; 5]).unwrap_err();
        assert!(matches!(err, EngineError::UnalignedBuffer { len: 5 }));
    }

    #[test]
    fn test_from_raw_rejects_wrong_dimensions() {
        let err = PixelBuffer::from_raw(2, 2, vec![0; 12]).unwrap_err();
        assert!(matches!(err, EngineError::DimensionMismatch { expected: 16, .. }));
    }

    #[test]
    fn test_pixel_access() {
        let buf = PixelBuffer::from_pixels(2, 1, &[[1, 2, 3, 4], [5, 6, 7, 8]]).unwrap();
        assert_eq!(buf.pixel(1, 0), Some([5, 6, 7, 8]));
        assert_eq!(buf.pixel(2, 0), None);
        assert_eq!(buf.alphas().collect::<Vec<_>>(), vec![4, 8]);
    }

    #[test]
    fn test_view_shape() {
        let buf = PixelBuffer::new(3, 2).unwrap();
        let view = buf.view().unwrap();
        assert_eq!(view.dim(), (2, 3, 4));
    }

    #[test]
    fn test_array_roundtrip() {
        let buf = PixelBuffer::from_pixels(2, 1, &[[9, 8, 7, 6], [5, 4, 3, 2]]).unwrap();
        let back = PixelBuffer::from_array(buf.view().unwrap().to_owned()).unwrap();
        assert_eq!(buf, back);
    }

    #[test]
    fn test_color_hex() {
        let c: Color = "#0a10ff".parse().unwrap();
        assert_eq!(c, Color::new(10, 16, 255));
        assert_eq!(c.to_hex(), "#0a10ff");
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("zzzzzz").is_err());
    }

    #[test]
    fn test_color_hex_rejects_signs() {
        assert!(Color::from_hex("#+1+2+3").is_err());
        assert!(Color::from_hex("-10203").is_err());
    }

    #[test]
    fn test_oversized_dimensions_fail() {
        let err = PixelBuffer::from_raw(1 << 31, 1 << 31, vec![]).unwrap_err();
        assert!(matches!(err, EngineError::TooLarge { .. }));
        assert!(matches!(PixelBuffer::new(u32::MAX, u32::MAX), Err(EngineError::TooLarge { .. })));
        assert!(PixelBuffer::new(0, u32::MAX).unwrap().is_empty());
    }

    #[test]
    fn test_tolerance_matches() {
        let reference = Color::new(100, 100, 100);
        assert!(Tolerance(0).matches([100, 100, 100, 255], reference));
        assert!(!Tolerance(0).matches([101, 100, 100, 255], reference));
        assert!(Tolerance(255).matches([0, 255, 0, 0], Color::new(255, 0, 255)));
    }
}
