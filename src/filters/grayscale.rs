//! Desaturating tints: Grayscale and Sepia.
//!
//! Both blend each pixel toward a target color by `amount` (0.0 = original,
//! 1.0 = fully converted), like the CSS `grayscale()` and `sepia()` filters.
//! Uses ITU-R BT.709 luminosity coefficients.

use ndarray::{Array3, ArrayView3};

use super::to_channel;

/// ITU-R BT.709 luminosity coefficients
pub const LUMA_R: f32 = 0.2126;
pub const LUMA_G: f32 = 0.7152;
pub const LUMA_B: f32 = 0.0722;

/// Standard sepia color matrix, one row per output channel.
const SEPIA: [[f32; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

/// Perceptual luminance of an RGB triple (any scale).
#[inline]
pub fn luma(r: f32, g: f32, b: f32) -> f32 {
    LUMA_R * r + LUMA_G * g + LUMA_B * b
}

#[inline]
fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Blend RGB toward its luminance.
///
/// # Arguments
/// * `input` - RGB or RGBA image (height, width, 3|4); other layouts are copied
/// * `amount` - 0.0 to 1.0
pub fn grayscale_u8(input: ArrayView3<u8>, amount: f32) -> Array3<u8> {
    let (height, width, channels) = input.dim();
    let mut output = input.to_owned();
    if channels < 3 {
        return output;
    }

    for y in 0..height {
        for x in 0..width {
            let r = input[[y, x, 0]] as f32;
            let g = input[[y, x, 1]] as f32;
            let b = input[[y, x, 2]] as f32;
            let gray = luma(r, g, b);

            output[[y, x, 0]] = to_channel(lerp(r, gray, amount));
            output[[y, x, 1]] = to_channel(lerp(g, gray, amount));
            output[[y, x, 2]] = to_channel(lerp(b, gray, amount));
        }
    }
    output
}

/// Blend RGB toward its sepia-toned value.
///
/// # Arguments
/// * `input` - RGB or RGBA image (height, width, 3|4); other layouts are copied
/// * `amount` - 0.0 to 1.0
pub fn sepia_u8(input: ArrayView3<u8>, amount: f32) -> Array3<u8> {
    let (height, width, channels) = input.dim();
    let mut output = input.to_owned();
    if channels < 3 {
        return output;
    }

    for y in 0..height {
        for x in 0..width {
            let rgb = [
                input[[y, x, 0]] as f32,
                input[[y, x, 1]] as f32,
                input[[y, x, 2]] as f32,
            ];
            for (c, row) in SEPIA.iter().enumerate() {
                let toned = row[0] * rgb[0] + row[1] * rgb[1] + row[2] * rgb[2];
                output[[y, x, c]] = to_channel(lerp(rgb[c], toned.min(255.0), amount));
            }
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
    fn test_grayscale_full_red() {
        let img = rgba(255, 0, 0, 255);

        let result = grayscale_u8(img.view(), 1.0);

        // 0.2126 * 255 ≈ 54
        assert_eq!(result[[0, 0, 0]], 54);
        assert_eq!(result[[0, 0, 0]], result[[0, 0, 1]]);
        assert_eq!(result[[0, 0, 1]], result[[0, 0, 2]]);
        assert_eq!(result[[0, 0, 3]], 255);
    }

    #[test]
    fn test_grayscale_half_blend() {
        let img = rgba(0, 255, 0, 40);

        let result = grayscale_u8(img.view(), 0.5);

        // luma = 182.376, halfway from 0 is 91.188 and from 255 is 218.688
        assert_eq!(result[[0, 0, 0]], 91);
        assert_eq!(result[[0, 0, 1]], 219);
        assert_eq!(result[[0, 0, 2]], 91);
        assert_eq!(result[[0, 0, 3]], 40);
    }

    #[test]
    fn test_sepia_white_is_warm() {
        let img = rgba(255, 255, 255, 255);

        let result = sepia_u8(img.view(), 1.0);

        assert!(result[[0, 0, 0]] >= result[[0, 0, 1]]);
        assert!(result[[0, 0, 1]] > result[[0, 0, 2]]);
        assert_eq!(result[[0, 0, 0]], 255);
        assert_eq!(result[[0, 0, 2]], 239); // 0.937 * 255
    }

    #[test]
    fn test_sepia_zero_amount_copies() {
        let img = rgba(12, 34, 56, 78);
        assert_eq!(sepia_u8(img.view(), 0.0), img);
    }

    #[test]
    fn test_single_channel_passthrough() {
        let img = Array3::from_shape_vec((1, 2, 1), vec![5u8, 250]).unwrap();
        assert_eq!(grayscale_u8(img.view(), 1.0), img);
        assert_eq!(sepia_u8(img.view(), 1.0), img);
    }
}
