//! Mirror transforms.
//!
//! - Horizontal: (x, y) -> (W - 1 - x, y)
//! - Vertical: (x, y) -> (x, H - 1 - y)
//!
//! Both keep the dimensions and undo themselves when applied twice.

use serde::{Deserialize, Serialize};

use crate::buffer::{PixelBuffer, CHANNELS};

/// Mirror axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Axis {
    /// Mirror left-right (reverse each row).
    Horizontal,
    /// Mirror top-bottom (reverse row order).
    Vertical,
}

/// Mirror `buffer` along `axis` into a new buffer.
pub fn flip(buffer: &PixelBuffer, axis: Axis) -> PixelBuffer {
    let mut output = buffer.clone();
    let row_len = buffer.width() as usize * CHANNELS;
    if row_len == 0 {
        return output;
    }

    let src_rows = buffer.as_bytes().chunks_exact(row_len);
    let dst_rows = output.as_bytes_mut().chunks_exact_mut(row_len);

    match axis {
        Axis::Vertical => {
            for (dst, src) in dst_rows.zip(src_rows.rev()) {
                dst.copy_from_slice(src);
            }
        }
        Axis::Horizontal => {
            for (dst, src) in dst_rows.zip(src_rows) {
                for (d, s) in dst.chunks_exact_mut(CHANNELS).zip(src.chunks_exact(CHANNELS).rev()) {
                    d.copy_from_slice(s);
                }
            }
        }
    }

    output
}
