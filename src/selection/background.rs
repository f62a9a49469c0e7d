//! Background removal by color distance.
//!
//! A pixel is background when each of its RGB channels lies within the
//! tolerance of the reference color. Background pixels get alpha 0, every
//! other byte is copied unchanged.
//!
//! The default [`MaskMode::Global`] decides every pixel on its own, so a
//! subject pixel that happens to share the background color also turns
//! transparent. [`MaskMode::BorderConnected`] only clears matches that are
//! reachable from the image border through other matches.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::buffer::{Color, PixelBuffer, Tolerance, CHANNELS};

/// Which matching pixels are cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaskMode {
    /// Every matching pixel, wherever it is.
    #[default]
    Global,
    /// Only matching pixels 4-connected to the image border.
    BorderConnected,
}

/// Background removal result with diagnostics.
#[derive(Debug, Clone)]
pub struct BackgroundRemoval {
    /// Masked copy of the input.
    pub buffer: PixelBuffer,
    /// Pixels that matched the reference color (and the mode's connectivity rule).
    pub matched_pixels: usize,
    /// Matched pixels whose alpha was not already 0.
    pub changed_pixels: usize,
    /// Bounds of matched pixels as (x, y, width, height).
    pub bounds: Option<(u32, u32, u32, u32)>,
}

/// Clear alpha on every pixel within `tolerance` of `reference`.
pub fn remove_background(buffer: &PixelBuffer, reference: Color, tolerance: Tolerance) -> PixelBuffer {
    remove_background_detailed(buffer, reference, tolerance, MaskMode::Global).buffer
}

/// Background removal with an explicit mode and pixel counts.
pub fn remove_background_detailed(
    buffer: &PixelBuffer,
    reference: Color,
    tolerance: Tolerance,
    mode: MaskMode,
) -> BackgroundRemoval {
    let mask = match mode {
        MaskMode::Global => global_mask(buffer, reference, tolerance),
        MaskMode::BorderConnected => border_connected_mask(buffer, reference, tolerance),
    };

    let width = buffer.width() as usize;
    let mut output = buffer.clone();
    let mut matched_pixels = 0;
    let mut changed_pixels = 0;
    let mut min_x = usize::MAX;
    let mut min_y = usize::MAX;
    let mut max_x = 0;
    let mut max_y = 0;

    for (i, px) in output.as_bytes_mut().chunks_exact_mut(CHANNELS).enumerate() {
        if !mask[i] {
            continue;
        }
        matched_pixels += 1;
        if px[3] != 0 {
            px[3] = 0;
            changed_pixels += 1;
        }
        let (x, y) = (i % width, i / width);
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }

    let bounds = if matched_pixels > 0 {
        Some((
            min_x as u32,
            min_y as u32,
            (max_x - min_x + 1) as u32,
            (max_y - min_y + 1) as u32,
        ))
    } else {
        None
    };

    tracing::debug!(
        reference = %reference,
        tolerance = tolerance.0,
        ?mode,
        matched_pixels,
        changed_pixels,
        "background mask applied"
    );

    BackgroundRemoval {
        buffer: output,
        matched_pixels,
        changed_pixels,
        bounds,
    }
}

fn global_mask(buffer: &PixelBuffer, reference: Color, tolerance: Tolerance) -> Vec<bool> {
    buffer
        .as_bytes()
        .chunks_exact(CHANNELS)
        .map(|px| tolerance.matches([px[0], px[1], px[2], px[3]], reference))
        .collect()
}

/// Flood fill seeded from every matching border pixel.
fn border_connected_mask(buffer: &PixelBuffer, reference: Color, tolerance: Tolerance) -> Vec<bool> {
    let width = buffer.width() as usize;
    let height = buffer.height() as usize;
    let matches = global_mask(buffer, reference, tolerance);
    let mut mask = vec![false; width * height];

    if width == 0 || height == 0 {
        return mask;
    }

    let mut queue = VecDeque::new();
    let seed = |x: usize, y: usize, mask: &mut [bool], queue: &mut VecDeque<(usize, usize)>| {
        let idx = y * width + x;
        if matches[idx] && !mask[idx] {
            mask[idx] = true;
            queue.push_back((x, y));
        }
    };

    for x in 0..width {
        seed(x, 0, &mut mask, &mut queue);
        seed(x, height - 1, &mut mask, &mut queue);
    }
    for y in 0..height {
        seed(0, y, &mut mask, &mut queue);
        seed(width - 1, y, &mut mask, &mut queue);
    }

    while let Some((x, y)) = queue.pop_front() {
        for (dx, dy) in [(-1i64, 0i64), (1, 0), (0, -1), (0, 1)] {
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                continue;
            }
            seed(nx as usize, ny as usize, &mut mask, &mut queue);
        }
    }

    mask
}
