//! Editing session for one image loaded in the panel.
//!
//! Holds what the panel used to keep in loose globals: the full-resolution
//! source, the preview scale, the crop rectangle (in preview space) and the
//! filter sliders. Operations run one at a time; each builds its result
//! first and only then replaces the source, so a failed step leaves the
//! session as it was.

use image::imageops::{self, FilterType};
use image::Rgba32FImage;

use crate::buffer::{Color, PixelBuffer, Tolerance};
use crate::codec::encode_png;
use crate::error::{EngineError, Result};
use crate::filters::{apply_filters, FilterState};
use crate::selection::{remove_background_detailed, BackgroundRemoval, MaskMode};
use crate::transform::{crop, fit_scale, flip, scaled_size, Axis, Corner, CropRect};

/// Default preview box of the panel, in CSS pixels.
pub const DEFAULT_PREVIEW_WIDTH: u32 = 400;
pub const DEFAULT_PREVIEW_HEIGHT: u32 = 300;

#[derive(Debug, Clone)]
pub struct EditSession {
    source: PixelBuffer,
    max_preview: (u32, u32),
    scale: f64,
    crop: CropRect,
    filters: FilterState,
}

impl EditSession {
    /// Start editing `source`, previewed inside a `max_width` x `max_height` box.
    pub fn open(source: PixelBuffer, max_width: u32, max_height: u32) -> Self {
        let mut session = Self {
            source,
            max_preview: (max_width, max_height),
            scale: 1.0,
            crop: CropRect::default(),
            filters: FilterState::default(),
        };
        session.refit();
        session
    }

    pub fn source(&self) -> &PixelBuffer {
        &self.source
    }

    /// Preview size / source size.
    pub fn preview_scale(&self) -> f64 {
        self.scale
    }

    pub fn preview_size(&self) -> (u32, u32) {
        scaled_size(self.source.width(), self.source.height(), self.scale)
    }

    /// Current crop rectangle in preview coordinates.
    pub fn crop_rect(&self) -> CropRect {
        self.crop
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn set_filters(&mut self, filters: FilterState) {
        self.filters = filters.clamped();
    }

    /// Drag a crop handle to a pointer position in preview space.
    pub fn drag_corner(&mut self, corner: Corner, x: f64, y: f64) -> CropRect {
        let (w, h) = self.preview_size();
        self.crop = self.crop.drag_corner(corner, x, y, w, h);
        self.crop
    }

    /// Replace the crop rectangle (preview space), clamped to the preview.
    pub fn set_crop(&mut self, rect: CropRect) -> CropRect {
        let (w, h) = self.preview_size();
        self.crop = rect.clamped_to(w, h);
        self.crop
    }

    pub fn reset_crop(&mut self) {
        let (w, h) = self.preview_size();
        self.crop = CropRect::full(w, h);
    }

    /// Crop the source to the current rectangle.
    ///
    /// Returns the rectangle in source pixels, which the host uses to place
    /// the cropped image over the original.
    pub fn apply_crop(&mut self) -> Result<CropRect> {
        let rect = self
            .crop
            .to_source(self.scale, self.source.width(), self.source.height())?;
        let cropped = crop(&self.source, rect)?;
        self.replace_source(cropped);
        Ok(rect)
    }

    pub fn flip(&mut self, axis: Axis) {
        let flipped = flip(&self.source, axis);
        self.replace_source(flipped);
    }

    /// Make pixels close to `reference` transparent in the source.
    pub fn remove_background(&mut self, reference: Color, tolerance: Tolerance, mode: MaskMode) -> BackgroundRemoval {
        let result = remove_background_detailed(&self.source, reference, tolerance, mode);
        self.source = result.buffer.clone();
        result
    }

    /// Color under a preview-space pointer, for picking the background.
    pub fn sample_color(&self, x: f64, y: f64) -> Option<Color> {
        if !(x >= 0.0 && y >= 0.0) {
            return None;
        }
        let sx = (x / self.scale).floor() as u32;
        let sy = (y / self.scale).floor() as u32;
        self.source.pixel(sx, sy).map(Color::from_pixel)
    }

    /// Source with the filter stack applied, full resolution.
    pub fn render(&self) -> Result<PixelBuffer> {
        apply_filters(&self.source, &self.filters)
    }

    /// Downscaled preview with the filter stack applied.
    pub fn render_preview(&self) -> Result<PixelBuffer> {
        let (w, h) = self.preview_size();
        let preview = if (w, h) == self.source.dimensions() {
            self.source.clone()
        } else {
            resize_premultiplied(&self.source, w, h)?
        };
        apply_filters(&preview, &self.filters)
    }

    /// Rendered image as PNG bytes, ready for upload to the host.
    pub fn export_png(&self) -> Result<Vec<u8>> {
        encode_png(&self.render()?)
    }

    fn replace_source(&mut self, source: PixelBuffer) {
        tracing::debug!(
            from = ?self.source.dimensions(),
            to = ?source.dimensions(),
            "session source replaced"
        );
        self.source = source;
        self.refit();
    }

    fn refit(&mut self) {
        let (mw, mh) = self.max_preview;
        self.scale = fit_scale(self.source.width(), self.source.height(), mw, mh);
        self.reset_crop();
    }
}

/// Triangle-filter resize with color weighted by alpha, so transparent
/// pixels do not tint the edges of what stays visible.
fn resize_premultiplied(source: &PixelBuffer, width: u32, height: u32) -> Result<PixelBuffer> {
    let premultiplied: Vec<f32> = source
        .as_bytes()
        .chunks_exact(4)
        .flat_map(|px| {
            let a = px[3] as f32 / 255.0;
            [px[0] as f32 / 255.0 * a, px[1] as f32 / 255.0 * a, px[2] as f32 / 255.0 * a, a]
        })
        .collect();
    let image = Rgba32FImage::from_raw(source.width(), source.height(), premultiplied).ok_or(
        EngineError::DimensionMismatch {
            width: source.width(),
            height: source.height(),
            len: source.as_bytes().len(),
            expected: source.pixel_count() * 4,
        },
    )?;

    let resized = imageops::resize(&image, width, height, FilterType::Triangle);

    let channel = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
    let data = resized
        .into_raw()
        .chunks_exact(4)
        .flat_map(|px| {
            let a = px[3];
            if a > 0.0 {
                [channel(px[0] / a), channel(px[1] / a), channel(px[2] / a), channel(a)]
            } else {
                [0, 0, 0, 0]
            }
        })
        .collect();
    PixelBuffer::from_raw(width, height, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32) -> PixelBuffer {
        let pixels: Vec<[u8; 4]> = (0..height)
            .flat_map(|y| {
                (0..width).map(move |x| {
                    let v = if (x / 10 + y / 10) % 2 == 0 { 255 } else { 0 };
                    [v, (x % 256) as u8, (y % 256) as u8, 255]
                })
            })
            .collect();
        PixelBuffer::from_pixels(width, height, &pixels).unwrap()
    }

    #[test]
    fn test_open_fits_preview() {
        let session = EditSession::open(checker(800, 300), 400, 300);
        assert_eq!(session.preview_scale(), 0.5);
        assert_eq!(session.preview_size(), (400, 150));
        assert_eq!(session.crop_rect(), CropRect::full(400, 150));
    }

    #[test]
    fn test_apply_crop_maps_preview_to_source() {
        let mut session = EditSession::open(checker(200, 200), 100, 100);
        session.set_crop(CropRect::new(10, 10, 20, 20));

        let source_rect = session.apply_crop().unwrap();

        assert_eq!(source_rect, CropRect::new(20, 20, 40, 40));
        assert_eq!(session.source().dimensions(), (40, 40));
        // Source pixel (20, 20) is now the origin
        assert_eq!(session.source().pixel(0, 0).unwrap()[1], 20);
        assert_eq!(session.source().pixel(0, 0).unwrap()[2], 20);
        // Small result previews at full size with a fresh crop rect
        assert_eq!(session.preview_scale(), 1.0);
        assert_eq!(session.crop_rect(), CropRect::full(40, 40));
    }

    #[test]
    fn test_zero_preview_box_still_crops() {
        let mut session = EditSession::open(checker(60, 40), 0, 0);
        assert_eq!(session.preview_scale(), 1.0);
        session.set_crop(CropRect::new(10, 5, 30, 20));

        assert_eq!(session.apply_crop().unwrap(), CropRect::new(10, 5, 30, 20));
        assert_eq!(session.source().dimensions(), (30, 20));
    }

    #[test]
    fn test_drag_then_crop() {
        let mut session = EditSession::open(checker(100, 100), 100, 100);
        session.drag_corner(Corner::TopLeft, 50.0, 60.0);
        session.drag_corner(Corner::BottomRight, 70.0, 200.0);
        assert_eq!(session.crop_rect(), CropRect::new(50, 60, 20, 40));

        session.apply_crop().unwrap();
        assert_eq!(session.source().dimensions(), (20, 40));
    }

    #[test]
    fn test_failed_operation_keeps_source() {
        let mut session = EditSession::open(checker(50, 50), 50, 50);
        let before = session.source().clone();
        session.crop = CropRect::new(60, 0, 20, 20); // bypasses clamping

        assert!(session.apply_crop().is_err());
        assert_eq!(session.source(), &before);
    }

    #[test]
    fn test_remove_background_and_export() {
        let buf = PixelBuffer::from_pixels(2, 1, &[[255, 255, 255, 255], [1, 2, 3, 255]]).unwrap();
        let mut session = EditSession::open(buf, 10, 10);

        let result = session.remove_background(Color::WHITE, Tolerance(3), MaskMode::Global);

        assert_eq!(result.changed_pixels, 1);
        assert_eq!(session.source().pixel(0, 0).unwrap()[3], 0);
        let png = session.export_png().unwrap();
        assert_eq!(crate::codec::decode_image(&png).unwrap(), *session.source());
    }

    #[test]
    fn test_flip_and_filters() {
        let mut session = EditSession::open(checker(30, 20), 100, 100);
        let original = session.source().clone();

        session.flip(Axis::Horizontal);
        assert_ne!(session.source(), &original);
        session.flip(Axis::Horizontal);
        assert_eq!(session.source(), &original);

        assert_eq!(session.render().unwrap(), original);
        session.set_filters(FilterState { grayscale: 250.0, ..Default::default() });
        assert_eq!(session.filters().grayscale, 100.0);
        let rendered = session.render().unwrap();
        assert!(rendered.as_bytes().chunks_exact(4).all(|px| px[0] == px[1] && px[1] == px[2]));
    }

    #[test]
    fn test_render_preview_size() {
        let session = EditSession::open(checker(80, 40), 40, 40);
        let preview = session.render_preview().unwrap();
        assert_eq!(preview.dimensions(), (40, 20));
    }

    #[test]
    fn test_preview_after_mask_keeps_subject_color() {
        // Left half white, right half red; white is masked out before the resize
        let pixels: Vec<[u8; 4]> = (0..8)
            .flat_map(|_| (0..8).map(|x| if x < 4 { [255, 255, 255, 255] } else { [255, 0, 0, 255] }))
            .collect();
        let mut session = EditSession::open(PixelBuffer::from_pixels(8, 8, &pixels).unwrap(), 3, 3);
        session.remove_background(Color::WHITE, Tolerance(0), MaskMode::Global);

        let preview = session.render_preview().unwrap();

        assert_eq!(preview.dimensions(), (3, 3));
        for px in preview.as_bytes().chunks_exact(4).filter(|px| px[3] > 0) {
            assert_eq!(&px[..3], &[255, 0, 0]);
        }
    }

    #[test]
    fn test_sample_color_uses_source_pixels() {
        let session = EditSession::open(checker(200, 200), 100, 100);
        // Preview (30, 5) is source (60, 10)
        let c = session.sample_color(30.0, 5.0).unwrap();
        assert_eq!((c.g, c.b), (60, 10));
        assert_eq!(session.sample_color(-1.0, 0.0), None);
        assert_eq!(session.sample_color(100.0, 0.0), None);
    }
}
