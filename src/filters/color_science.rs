//! Hue rotation through HSL.
//!
//! - **Grayscale (1 channel)**: No-op (hue needs RGB)
//! - **RGB (3 channels)**: Full color processing
//! - **RGBA (4 channels)**: RGB processed, alpha preserved

use ndarray::{Array3, ArrayView3};

use super::to_channel;

// ============================================================================
// Color Space Conversion Utilities
// ============================================================================

/// Convert RGB to HSL.
/// Input: r, g, b in 0.0-1.0
/// Output: (h, s, l) where h is 0.0-360.0, s and l are 0.0-1.0
#[inline]
pub fn rgb_to_hsl(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    let d = max - min;

    if d.abs() < 1e-6 {
        return (0.0, 0.0, l);
    }

    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let h = if max == r {
        ((g - b) / d).rem_euclid(6.0)
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    (h * 60.0, s, l)
}

/// Convert HSL to RGB.
/// Input: h in degrees (any value, wrapped), s and l in 0.0-1.0
/// Output: (r, g, b) in 0.0-1.0
#[inline]
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (f32, f32, f32) {
    if s.abs() < 1e-6 {
        return (l, l, l);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let t = h.rem_euclid(360.0) / 360.0;

    (
        hue_to_channel(p, q, t + 1.0 / 3.0),
        hue_to_channel(p, q, t),
        hue_to_channel(p, q, t - 1.0 / 3.0),
    )
}

#[inline]
fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

// ============================================================================
// Hue Rotation
// ============================================================================

/// Rotate the hue of every pixel by `degrees`.
///
/// Saturation and lightness are kept, so grays stay gray.
///
/// # Arguments
/// * `input` - Image with 1, 3, or 4 channels (height, width, channels)
/// * `degrees` - Rotation in degrees, wraps around 360
pub fn hue_rotate_u8(input: ArrayView3<u8>, degrees: f32) -> Array3<u8> {
    let (height, width, channels) = input.dim();
    let mut output = input.to_owned();
    if channels < 3 {
        return output;
    }

    for y in 0..height {
        for x in 0..width {
            let r = input[[y, x, 0]] as f32 / 255.0;
            let g = input[[y, x, 1]] as f32 / 255.0;
            let b = input[[y, x, 2]] as f32 / 255.0;

            let (h, s, l) = rgb_to_hsl(r, g, b);
            let (nr, ng, nb) = hsl_to_rgb(h + degrees, s, l);

            output[[y, x, 0]] = to_channel(nr * 255.0);
            output[[y, x, 1]] = to_channel(ng * 255.0);
            output[[y, x, 2]] = to_channel(nb * 255.0);
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
    fn test_rgb_hsl_roundtrip() {
        for (r, g, b) in [(0.8, 0.4, 0.2), (0.1, 0.9, 0.3), (0.2, 0.3, 0.95), (0.5, 0.5, 0.5)] {
            let (h, s, l) = rgb_to_hsl(r, g, b);
            let (nr, ng, nb) = hsl_to_rgb(h, s, l);

            assert!((r - nr).abs() < 0.001);
            assert!((g - ng).abs() < 0.001);
            assert!((b - nb).abs() < 0.001);
        }
    }

    #[test]
    fn test_primary_hues() {
        assert!((rgb_to_hsl(1.0, 0.0, 0.0).0 - 0.0).abs() < 0.01);
        assert!((rgb_to_hsl(0.0, 1.0, 0.0).0 - 120.0).abs() < 0.01);
        assert!((rgb_to_hsl(0.0, 0.0, 1.0).0 - 240.0).abs() < 0.01);
        assert!((rgb_to_hsl(1.0, 0.0, 1.0).0 - 300.0).abs() < 0.01);
    }

    #[test]
    fn test_hue_rotate_180_red_to_cyan() {
        let img = rgba(255, 0, 0, 200);

        let result = hue_rotate_u8(img.view(), 180.0);

        assert_eq!(result[[0, 0, 0]], 0);
        assert_eq!(result[[0, 0, 1]], 255);
        assert_eq!(result[[0, 0, 2]], 255);
        assert_eq!(result[[0, 0, 3]], 200);
    }

    #[test]
    fn test_hue_rotate_negative_wraps() {
        let img = rgba(255, 0, 0, 255);

        let result = hue_rotate_u8(img.view(), -120.0);

        // Red minus 120 degrees is blue
        assert_eq!(result[[0, 0, 0]], 0);
        assert_eq!(result[[0, 0, 1]], 0);
        assert_eq!(result[[0, 0, 2]], 255);
    }

    #[test]
    fn test_hue_rotate_full_turn() {
        let img = rgba(200, 100, 50, 255);
        let result = hue_rotate_u8(img.view(), 360.0);
        for c in 0..3 {
            assert!((result[[0, 0, c]] as i32 - img[[0, 0, c]] as i32).abs() <= 1);
        }
    }

    #[test]
    fn test_hue_rotate_keeps_gray() {
        let img = rgba(77, 77, 77, 255);
        assert_eq!(hue_rotate_u8(img.view(), 90.0), img);
    }
}
