//! Transport encodings for pixel buffers.
//!
//! - PNG bytes, the container the design host accepts for image fills.
//! - Base64 text (standard alphabet, padded) for JSON messages.
//! - `data:image/png;base64,...` URLs, the form the host script hands to the panel.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{ImageFormat, RgbaImage};

use crate::buffer::PixelBuffer;
use crate::error::{EngineError, Result};

pub const PNG_MIME: &str = "image/png";
const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Encode as a PNG with an alpha channel.
pub fn encode_png(buffer: &PixelBuffer) -> Result<Vec<u8>> {
    let image = RgbaImage::from_raw(buffer.width(), buffer.height(), buffer.as_bytes().to_vec()).ok_or(
        EngineError::DimensionMismatch {
            width: buffer.width(),
            height: buffer.height(),
            len: buffer.as_bytes().len(),
            expected: buffer.pixel_count() * 4,
        },
    )?;

    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

/// Decode PNG (or any format the `image` build supports) into RGBA8.
pub fn decode_image(bytes: &[u8]) -> Result<PixelBuffer> {
    let image = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = image.dimensions();
    PixelBuffer::from_raw(width, height, image.into_raw())
}

pub fn encode_base64(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

pub fn decode_base64(text: &str) -> Result<Vec<u8>> {
    Ok(BASE64.decode(text.trim())?)
}

/// Wrap PNG bytes in a data URL.
pub fn to_png_data_url(png: &[u8]) -> String {
    format!("{PNG_DATA_URL_PREFIX}{}", encode_base64(png))
}

/// Split a base64 data URL into its MIME type and decoded bytes.
pub fn parse_data_url(url: &str) -> Result<(String, Vec<u8>)> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| EngineError::MalformedDataUrl("missing data: scheme".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| EngineError::MalformedDataUrl("missing ',' separator".to_string()))?;
    let mime = meta
        .strip_suffix(";base64")
        .ok_or_else(|| EngineError::MalformedDataUrl(format!("not base64 encoded: {meta}")))?;
    Ok((mime.to_string(), decode_base64(payload)?))
}

/// Encode a buffer straight to a PNG data URL.
pub fn buffer_to_data_url(buffer: &PixelBuffer) -> Result<String> {
    Ok(to_png_data_url(&encode_png(buffer)?))
}

/// Decode a PNG data URL (or bare base64 PNG) into a buffer.
pub fn buffer_from_base64(text: &str) -> Result<PixelBuffer> {
    let bytes = if text.starts_with("data:") {
        parse_data_url(text)?.1
    } else {
        decode_base64(text)?
    };
    decode_image(&bytes)
}
