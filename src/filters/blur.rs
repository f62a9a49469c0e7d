//! Box blur for RGBA images.
//!
//! Every output pixel is the mean of the (2r+1) x (2r+1) neighbourhood
//! clipped to the image. For 4-channel input the color channels are
//! weighted by alpha (premultiplied), so fully transparent pixels add no
//! color to their visible neighbours. Other channel counts are averaged
//! straight.
//!
//! The clipped window is a product of a row range and a column range, so the
//! mean is computed as two separable passes over prefix sums.

use ndarray::{Array3, ArrayView3};

use super::to_channel;
use crate::buffer::CHANNELS;

/// Apply box blur.
///
/// # Arguments
/// * `input` - Image (height, width, channels)
/// * `radius` - Blur radius in pixels, 0 returns a copy
///
/// # Returns
/// Blurred image with same dimensions
pub fn box_blur_u8(input: ArrayView3<u8>, radius: usize) -> Array3<u8> {
    let (height, width, channels) = input.dim();
    if radius == 0 || height == 0 || width == 0 {
        return input.to_owned();
    }
    let alpha = (channels == CHANNELS).then_some(CHANNELS - 1);

    let mut weighted = input.mapv(|v| v as f32);
    if let Some(a) = alpha {
        for mut px in weighted.rows_mut() {
            let coverage = px[a] / 255.0;
            for c in 0..a {
                px[c] *= coverage;
            }
        }
    }

    let mean = box_mean(weighted, radius);

    let mut output = Array3::<u8>::zeros((height, width, channels));
    for y in 0..height {
        for x in 0..width {
            match alpha {
                Some(a) => {
                    let coverage = mean[[y, x, a]];
                    if coverage > 0.0 {
                        for c in 0..a {
                            output[[y, x, c]] = to_channel(mean[[y, x, c]] * 255.0 / coverage);
                        }
                    }
                    output[[y, x, a]] = to_channel(coverage);
                }
                None => {
                    for c in 0..channels {
                        output[[y, x, c]] = to_channel(mean[[y, x, c]]);
                    }
                }
            }
        }
    }

    output
}

/// Separable clipped-window mean of every channel.
fn box_mean(input: Array3<f32>, radius: usize) -> Array3<f32> {
    let (height, width, channels) = input.dim();

    // Horizontal pass: row means
    let mut temp = Array3::<f32>::zeros((height, width, channels));
    let mut prefix = vec![0.0f32; width + 1];
    for y in 0..height {
        for c in 0..channels {
            for x in 0..width {
                prefix[x + 1] = prefix[x] + input[[y, x, c]];
            }
            for x in 0..width {
                let (lo, hi) = window(x, radius, width);
                temp[[y, x, c]] = (prefix[hi] - prefix[lo]) / (hi - lo) as f32;
            }
        }
    }

    // Vertical pass over the row means
    let mut output = Array3::<f32>::zeros((height, width, channels));
    let mut prefix = vec![0.0f32; height + 1];
    for x in 0..width {
        for c in 0..channels {
            for y in 0..height {
                prefix[y + 1] = prefix[y] + temp[[y, x, c]];
            }
            for y in 0..height {
                let (lo, hi) = window(y, radius, height);
                output[[y, x, c]] = (prefix[hi] - prefix[lo]) / (hi - lo) as f32;
            }
        }
    }

    output
}

/// Half-open clipped window `[lo, hi)` around `center`.
#[inline]
fn window(center: usize, radius: usize, len: usize) -> (usize, usize) {
    (center.saturating_sub(radius), (center + radius + 1).min(len))
}
