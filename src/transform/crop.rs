//! Crop rectangles and crop extraction.
//!
//! The panel shows a shrunk preview of large images. Crop handles are
//! dragged in preview space and the rectangle is mapped back to the
//! full-resolution source with [`CropRect::to_source`] before extraction.

use ndarray::s;
use serde::{Deserialize, Serialize};

use crate::buffer::PixelBuffer;
use crate::error::{EngineError, Result};

/// Smallest crop edge the interactive editor allows, in pixels.
pub const MIN_CROP_SIZE: u32 = 20;

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Crop handle being dragged. The opposite corner stays put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl CropRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle covering a whole `width` x `height` image.
    pub const fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Non-empty and inside a `width` x `height` image.
    pub fn fits(&self, width: u32, height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.x as u64 + self.width as u64 <= width as u64
            && self.y as u64 + self.height as u64 <= height as u64
    }

    /// Fail with [`EngineError::CropOutOfBounds`] unless the rect fits.
    pub fn validate(&self, width: u32, height: u32) -> Result<()> {
        if self.fits(width, height) {
            Ok(())
        } else {
            Err(EngineError::CropOutOfBounds {
                x: self.x,
                y: self.y,
                width: self.width,
                height: self.height,
                source_width: width,
                source_height: height,
            })
        }
    }

    /// Pull the rect inside the bounds and grow it to the minimum size.
    ///
    /// Size wins over position: an oversized rect shrinks to the bounds, then
    /// the origin moves left/up until the rect fits.
    pub fn clamped_to(self, width: u32, height: u32) -> Self {
        let w = self.width.clamp(min_extent(width), width);
        let h = self.height.clamp(min_extent(height), height);
        Self {
            x: self.x.min(width - w),
            y: self.y.min(height - h),
            width: w,
            height: h,
        }
    }

    /// Move `corner` to the pointer position `(px, py)`.
    ///
    /// The result always fits the bounds and is never smaller than
    /// [`MIN_CROP_SIZE`] (or the bound itself when the image is smaller).
    pub fn drag_corner(self, corner: Corner, px: f64, py: f64, width: u32, height: u32) -> Self {
        let rect = self.clamped_to(width, height);
        let min_w = min_extent(width);
        let min_h = min_extent(height);
        let (left, top, right, bottom) = (rect.x, rect.y, rect.right(), rect.bottom());

        let (left, right) = match corner {
            Corner::TopLeft | Corner::BottomLeft => (clamp_coord(px, 0, right - min_w), right),
            Corner::TopRight | Corner::BottomRight => (left, clamp_coord(px, left + min_w, width)),
        };
        let (top, bottom) = match corner {
            Corner::TopLeft | Corner::TopRight => (clamp_coord(py, 0, bottom - min_h), bottom),
            Corner::BottomLeft | Corner::BottomRight => (top, clamp_coord(py, top + min_h, height)),
        };

        Self::new(left, top, right - left, bottom - top)
    }

    /// Map a rect captured on a preview shown at `scale` (preview / source)
    /// to full-resolution source coordinates.
    ///
    /// Edges are scaled and rounded independently so neighbouring rects stay
    /// adjacent; rounding overshoot is clamped to the source bounds.
    pub fn to_source(self, scale: f64, source_width: u32, source_height: u32) -> Result<Self> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(EngineError::InvalidScale(scale));
        }
        let map = |v: u32, bound: u32| ((v as f64 / scale).round().max(0.0) as u64).min(bound as u64) as u32;

        let x0 = map(self.x, source_width);
        let y0 = map(self.y, source_height);
        let x1 = map(self.right(), source_width);
        let y1 = map(self.bottom(), source_height);

        let rect = Self::new(x0, y0, x1 - x0, y1 - y0);
        rect.validate(source_width, source_height)?;
        Ok(rect)
    }
}

fn min_extent(bound: u32) -> u32 {
    MIN_CROP_SIZE.min(bound)
}

fn clamp_coord(v: f64, lo: u32, hi: u32) -> u32 {
    if v.is_nan() {
        return lo;
    }
    v.round().clamp(lo as f64, hi as f64) as u32
}

/// Scale that fits a `source` image into a `max` preview box without upscaling.
///
/// A box with a zero side places no limit and gives 1.0.
pub fn fit_scale(source_width: u32, source_height: u32, max_width: u32, max_height: u32) -> f64 {
    if source_width == 0 || source_height == 0 || max_width == 0 || max_height == 0 {
        return 1.0;
    }
    let sx = max_width as f64 / source_width as f64;
    let sy = max_height as f64 / source_height as f64;
    sx.min(sy).min(1.0)
}

/// Preview dimensions for `scale`, at least 1x1 for a non-empty source.
pub fn scaled_size(source_width: u32, source_height: u32, scale: f64) -> (u32, u32) {
    let scale_dim = |v: u32| {
        if v == 0 {
            0
        } else {
            ((v as f64 * scale).round() as u32).max(1)
        }
    };
    (scale_dim(source_width), scale_dim(source_height))
}

/// Copy the sub-rectangle `rect` out of `buffer`. No resampling.
pub fn crop(buffer: &PixelBuffer, rect: CropRect) -> Result<PixelBuffer> {
    rect.validate(buffer.width(), buffer.height())?;

    let (x, y) = (rect.x as usize, rect.y as usize);
    let (w, h) = (rect.width as usize, rect.height as usize);

    let view = buffer.view()?;
    let region = view.slice(s![y..y + h, x..x + w, ..]).to_owned();

    tracing::debug!(
        source_width = buffer.width(),
        source_height = buffer.height(),
        ?rect,
        "crop extracted"
    );

    PixelBuffer::from_array(region)
}
