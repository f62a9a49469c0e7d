//! Tonal adjustments: Brightness, Contrast, Saturation.
//!
//! Pixel-wise operations without spatial context. Input and output are
//! (height, width, channels) u8 arrays; with 4 channels the alpha channel is
//! copied through untouched.

use ndarray::{Array3, ArrayView3};

use super::grayscale::luma;
use super::to_channel;

// ============================================================================
// Brightness
// ============================================================================

/// Shift every color channel by `amount * 255`.
///
/// # Arguments
/// * `input` - Image with 1, 3, or 4 channels (height, width, channels)
/// * `amount` - -1.0 (black) to 1.0 (white), 0.0 = no change
pub fn brightness_u8(input: ArrayView3<u8>, amount: f32) -> Array3<u8> {
    let (height, width, channels) = input.dim();
    let mut output = input.to_owned();
    let offset = amount * 255.0;
    let color_channels = if channels == 4 { 3 } else { channels };

    for y in 0..height {
        for x in 0..width {
            for c in 0..color_channels {
                output[[y, x, c]] = to_channel(input[[y, x, c]] as f32 + offset);
            }
        }
    }
    output
}

// ============================================================================
// Contrast
// ============================================================================

/// Stretch or compress channel values around mid-gray.
///
/// Positive amounts scale up to 4x (at 1.0), negative amounts fade toward
/// flat gray (at -1.0).
///
/// # Arguments
/// * `input` - Image with 1, 3, or 4 channels (height, width, channels)
/// * `amount` - -1.0 to 1.0, 0.0 = no change
pub fn contrast_u8(input: ArrayView3<u8>, amount: f32) -> Array3<u8> {
    let (height, width, channels) = input.dim();
    let mut output = input.to_owned();
    let factor = contrast_factor(amount);
    let color_channels = if channels == 4 { 3 } else { channels };

    for y in 0..height {
        for x in 0..width {
            for c in 0..color_channels {
                let v = input[[y, x, c]] as f32;
                output[[y, x, c]] = to_channel((v - 127.5) * factor + 127.5);
            }
        }
    }
    output
}

#[inline]
fn contrast_factor(amount: f32) -> f32 {
    if amount >= 0.0 {
        1.0 + amount * 3.0
    } else {
        1.0 + amount
    }
}

// ============================================================================
// Saturation
// ============================================================================

/// Push colors away from (or toward) their BT.709 luminance.
///
/// Needs color channels; single-channel input is returned unchanged.
///
/// # Arguments
/// * `input` - Image with 1, 3, or 4 channels (height, width, channels)
/// * `amount` - -1.0 (grayscale) to 1.0 (double saturation), 0.0 = no change
pub fn saturation_u8(input: ArrayView3<u8>, amount: f32) -> Array3<u8> {
    let (height, width, channels) = input.dim();
    let mut output = input.to_owned();
    if channels < 3 {
        return output;
    }

    let factor = 1.0 + amount;

    for y in 0..height {
        for x in 0..width {
            let r = input[[y, x, 0]] as f32;
            let g = input[[y, x, 1]] as f32;
            let b = input[[y, x, 2]] as f32;
            let gray = luma(r, g, b);

            output[[y, x, 0]] = to_channel(gray + (r - gray) * factor);
            output[[y, x, 1]] = to_channel(gray + (g - gray) * factor);
            output[[y, x, 2]] = to_channel(gray + (b - gray) * factor);
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgba(r: u8, g: u8, b: u8, a: u8) -> Array3<u8> {
        Array3::from_shape_vec((1, 1, 4), vec![r, g, b, a]).unwrap()
    }

    #[test]
    fn test_brightness_offsets_and_clamps() {
        let img = rgba(100, 200, 0, 77);

        let result = brightness_u8(img.view(), 0.5);

        assert_eq!(result[[0, 0, 0]], 228); // 100 + 127.5 rounds up
        assert_eq!(result[[0, 0, 1]], 255);
        assert_eq!(result[[0, 0, 2]], 128);
        assert_eq!(result[[0, 0, 3]], 77); // Alpha preserved
    }

    #[test]
    fn test_brightness_negative() {
        let img = rgba(100, 10, 255, 255);
        let result = brightness_u8(img.view(), -0.2);
        assert_eq!(result[[0, 0, 0]], 49);
        assert_eq!(result[[0, 0, 1]], 0);
        assert_eq!(result[[0, 0, 2]], 204);
    }

    #[test]
    fn test_contrast_expands_away_from_mid() {
        let img = rgba(200, 50, 128, 255);

        let result = contrast_u8(img.view(), 0.5);

        assert!(result[[0, 0, 0]] > 200);
        assert!(result[[0, 0, 1]] < 50);
        assert_eq!(result[[0, 0, 2]], 129); // (0.5 * 2.5) + 127.5 = 128.75
        assert_eq!(result[[0, 0, 3]], 255);
    }

    #[test]
    fn test_contrast_minimum_is_flat_gray() {
        let img = rgba(0, 255, 30, 255);
        let result = contrast_u8(img.view(), -1.0);
        for c in 0..3 {
            assert_eq!(result[[0, 0, c]], 128);
        }
    }

    #[test]
    fn test_saturation_minimum_is_gray() {
        let img = rgba(255, 0, 0, 255);

        let result = saturation_u8(img.view(), -1.0);

        assert_eq!(result[[0, 0, 0]], result[[0, 0, 1]]);
        assert_eq!(result[[0, 0, 1]], result[[0, 0, 2]]);
        assert_eq!(result[[0, 0, 0]], 54); // 0.2126 * 255
    }

    #[test]
    fn test_saturation_keeps_neutral_gray() {
        let img = rgba(90, 90, 90, 10);
        let result = saturation_u8(img.view(), 1.0);
        assert_eq!(result, img);
    }

    #[test]
    fn test_saturation_grayscale_noop() {
        let img = Array3::from_shape_vec((1, 1, 1), vec![128u8]).unwrap();
        let result = saturation_u8(img.view(), 0.5);
        assert_eq!(result[[0, 0, 0]], 128);
    }
}
