//! Filter stack for the image editor sliders.
//!
//! ## Parameters
//!
//! | Parameter | Range | Unit | Neutral |
//! |-----------|-------|------|---------|
//! | brightness | -100..=100 | percent of full scale added | 0 |
//! | contrast | -100..=100 | percent | 0 |
//! | saturation | -100..=100 | percent | 0 |
//! | hue | -180..=180 | degrees | 0 |
//! | blur | 0..=20 | pixels (box radius, rounded) | 0 |
//! | grayscale | 0..=100 | percent blend | 0 |
//! | sepia | 0..=100 | percent blend | 0 |
//!
//! ## Order
//!
//! The stack always runs in this order, since the stages do not commute:
//!
//! 1. brightness
//! 2. contrast
//! 3. saturation
//! 4. hue
//! 5. grayscale
//! 6. sepia
//! 7. blur (the only neighbourhood stage, always last)
//!
//! Stages at their neutral value are skipped, so the all-zero state returns
//! the input bytes unchanged. Pointwise stages never touch alpha.

pub mod blur;
pub mod color_adjust;
pub mod color_science;
pub mod grayscale;

use serde::{Deserialize, Serialize};

use crate::buffer::PixelBuffer;
use crate::error::Result;

use self::blur::box_blur_u8;
use self::color_adjust::{brightness_u8, contrast_u8, saturation_u8};
use self::color_science::hue_rotate_u8;
use self::grayscale::{grayscale_u8, sepia_u8};

/// Round and clamp a channel value to u8.
#[inline]
pub(crate) fn to_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

pub const BRIGHTNESS_RANGE: (f32, f32) = (-100.0, 100.0);
pub const CONTRAST_RANGE: (f32, f32) = (-100.0, 100.0);
pub const SATURATION_RANGE: (f32, f32) = (-100.0, 100.0);
pub const HUE_RANGE: (f32, f32) = (-180.0, 180.0);
pub const BLUR_RANGE: (f32, f32) = (0.0, 20.0);
pub const GRAYSCALE_RANGE: (f32, f32) = (0.0, 100.0);
pub const SEPIA_RANGE: (f32, f32) = (0.0, 100.0);

/// Slider values of the image editor. `Default` is the neutral state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterState {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub hue: f32,
    pub blur: f32,
    pub grayscale: f32,
    pub sepia: f32,
}

impl FilterState {
    /// Copy with every parameter pulled into its range (NaN becomes neutral).
    pub fn clamped(&self) -> Self {
        Self {
            brightness: clamp_param(self.brightness, BRIGHTNESS_RANGE),
            contrast: clamp_param(self.contrast, CONTRAST_RANGE),
            saturation: clamp_param(self.saturation, SATURATION_RANGE),
            hue: clamp_param(self.hue, HUE_RANGE),
            blur: clamp_param(self.blur, BLUR_RANGE),
            grayscale: clamp_param(self.grayscale, GRAYSCALE_RANGE),
            sepia: clamp_param(self.sepia, SEPIA_RANGE),
        }
    }

    /// Blur radius in whole pixels.
    pub fn blur_radius(&self) -> usize {
        clamp_param(self.blur, BLUR_RANGE).round() as usize
    }

    /// True when rendering would return the input unchanged.
    pub fn is_neutral(&self) -> bool {
        let s = self.clamped();
        s.brightness == 0.0
            && s.contrast == 0.0
            && s.saturation == 0.0
            && s.hue == 0.0
            && s.grayscale == 0.0
            && s.sepia == 0.0
            && s.blur_radius() == 0
    }
}

fn clamp_param(v: f32, (lo, hi): (f32, f32)) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(lo, hi)
    }
}

/// Render `state` over `buffer` into a new buffer.
pub fn apply_filters(buffer: &PixelBuffer, state: &FilterState) -> Result<PixelBuffer> {
    let s = state.clamped();
    if s.is_neutral() {
        return Ok(buffer.clone());
    }

    let mut image = buffer.view()?.to_owned();

    if s.brightness != 0.0 {
        image = brightness_u8(image.view(), s.brightness / 100.0);
    }
    if s.contrast != 0.0 {
        image = contrast_u8(image.view(), s.contrast / 100.0);
    }
    if s.saturation != 0.0 {
        image = saturation_u8(image.view(), s.saturation / 100.0);
    }
    if s.hue != 0.0 {
        image = hue_rotate_u8(image.view(), s.hue);
    }
    if s.grayscale != 0.0 {
        image = grayscale_u8(image.view(), s.grayscale / 100.0);
    }
    if s.sepia != 0.0 {
        image = sepia_u8(image.view(), s.sepia / 100.0);
    }
    let radius = s.blur_radius();
    if radius > 0 {
        image = box_blur_u8(image.view(), radius);
    }

    tracing::debug!(
        width = buffer.width(),
        height = buffer.height(),
        filters = ?s,
        "filter stack rendered"
    );

    PixelBuffer::from_array(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient() -> PixelBuffer {
        let pixels: Vec<[u8; 4]> = (0..16u32)
            .map(|i| [(i * 16) as u8, (255 - i * 13) as u8, (i * 7 + 30) as u8, (i * 15 + 10) as u8])
            .collect();
        PixelBuffer::from_pixels(4, 4, &pixels).unwrap()
    }

    #[test]
    fn test_neutral_state_is_identity() {
        let buf = gradient();
        let out = apply_filters(&buf, &FilterState::default()).unwrap();
        assert_eq!(out, buf);
    }

    #[test]
    fn test_sub_pixel_blur_is_neutral() {
        let state = FilterState { blur: 0.4, ..Default::default() };
        assert!(state.is_neutral());
        assert_eq!(apply_filters(&gradient(), &state).unwrap(), gradient());
    }

    #[test]
    fn test_pointwise_stages_keep_alpha() {
        let buf = gradient();
        let state = FilterState {
            brightness: 20.0,
            contrast: -30.0,
            saturation: 50.0,
            hue: 45.0,
            grayscale: 40.0,
            sepia: 60.0,
            blur: 0.0,
        };
        let out = apply_filters(&buf, &state).unwrap();
        assert_eq!(out.alphas().collect::<Vec<_>>(), buf.alphas().collect::<Vec<_>>());
        assert_ne!(out, buf);
    }

    #[test]
    fn test_fixed_order_matches_manual_composition() {
        let buf = gradient();
        let state = FilterState {
            brightness: 10.0,
            grayscale: 100.0,
            sepia: 50.0,
            blur: 1.0,
            ..Default::default()
        };

        let view = buf.view().unwrap();
        let step = brightness_u8(view, 0.1);
        let step = grayscale_u8(step.view(), 1.0);
        let step = sepia_u8(step.view(), 0.5);
        let step = box_blur_u8(step.view(), 1);
        let expected = PixelBuffer::from_array(step).unwrap();

        assert_eq!(apply_filters(&buf, &state).unwrap(), expected);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let state = FilterState {
            brightness: 500.0,
            hue: -1000.0,
            blur: f32::NAN,
            sepia: -3.0,
            ..Default::default()
        };
        let clamped = state.clamped();
        assert_eq!(clamped.brightness, 100.0);
        assert_eq!(clamped.hue, -180.0);
        assert_eq!(clamped.blur, 0.0);
        assert_eq!(clamped.sepia, 0.0);

        // Full brightness saturates every color channel
        let out = apply_filters(&gradient(), &FilterState { brightness: 500.0, ..Default::default() }).unwrap();
        assert!(out.as_bytes().chunks_exact(4).all(|px| px[..3] == [255, 255, 255]));
    }

    #[test]
    fn test_filter_state_json() {
        let state: FilterState = serde_json::from_str(r#"{"brightness": 12.5, "hue": -90}"#).unwrap();
        assert_eq!(state.brightness, 12.5);
        assert_eq!(state.hue, -90.0);
        assert_eq!(state.sepia, 0.0);

        let json = serde_json::to_value(FilterState::default()).unwrap();
        assert_eq!(json["grayscale"], 0.0);
    }
}
