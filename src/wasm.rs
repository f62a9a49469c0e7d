//! WebAssembly exports for the panel.
//!
//! These functions are exposed to JavaScript via wasm-bindgen. Pixel data
//! crosses the boundary as flat RGBA bytes (length = width * height * 4)
//! plus the dimensions; errors surface as JavaScript exceptions.

use wasm_bindgen::prelude::*;

use crate::buffer::{Color, PixelBuffer, Tolerance};
use crate::codec;
use crate::filters::{apply_filters, FilterState};
use crate::prompt;
use crate::selection::{remove_background_detailed, MaskMode};
use crate::session::EditSession;
use crate::transform::{crop, flip, Axis, Corner, CropRect};

fn buffer(data: &[u8], width: u32, height: u32) -> Result<PixelBuffer, JsError> {
    Ok(PixelBuffer::from_raw(width, height, data.to_vec())?)
}

fn mask_mode(border_connected: bool) -> MaskMode {
    if border_connected {
        MaskMode::BorderConnected
    } else {
        MaskMode::Global
    }
}

fn corner(name: &str) -> Result<Corner, JsError> {
    serde_json::from_value(serde_json::Value::String(name.to_string()))
        .map_err(|_| JsError::new(&format!("unknown crop corner: {name}")))
}

fn rect_to_vec(rect: CropRect) -> Vec<u32> {
    vec![rect.x, rect.y, rect.width, rect.height]
}

// ============================================================================
// Background removal
// ============================================================================

/// Make every pixel within `tolerance` of (r, g, b) fully transparent.
///
/// # Arguments
/// * `data` - Flat array of RGBA bytes
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `tolerance` - Per-channel distance, inclusive
/// * `border_connected` - Only clear matches reachable from the image border
///
/// # Returns
/// Flat array of RGBA bytes with the background alpha set to 0
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn remove_background_wasm(
    data: &[u8],
    width: u32,
    height: u32,
    r: u8,
    g: u8,
    b: u8,
    tolerance: u32,
    border_connected: bool,
) -> Result<Vec<u8>, JsError> {
    let input = buffer(data, width, height)?;
    let result = remove_background_detailed(
        &input,
        Color::new(r, g, b),
        Tolerance(tolerance),
        mask_mode(border_connected),
    );
    Ok(result.buffer.into_raw())
}

// ============================================================================
// Crop & Flip
// ============================================================================

/// Copy the `crop_width` x `crop_height` region at (x, y).
///
/// Throws when the region does not fit inside the image.
#[wasm_bindgen]
pub fn crop_wasm(
    data: &[u8],
    width: u32,
    height: u32,
    x: u32,
    y: u32,
    crop_width: u32,
    crop_height: u32,
) -> Result<Vec<u8>, JsError> {
    let input = buffer(data, width, height)?;
    let out = crop(&input, CropRect::new(x, y, crop_width, crop_height))?;
    Ok(out.into_raw())
}

/// Map a preview-space crop rectangle to source pixels.
///
/// # Returns
/// `[x, y, width, height]` in source coordinates
#[wasm_bindgen]
pub fn map_crop_to_source_wasm(
    x: u32,
    y: u32,
    crop_width: u32,
    crop_height: u32,
    preview_scale: f64,
    source_width: u32,
    source_height: u32,
) -> Result<Vec<u32>, JsError> {
    let rect = CropRect::new(x, y, crop_width, crop_height).to_source(preview_scale, source_width, source_height)?;
    Ok(rect_to_vec(rect))
}

/// Move one crop handle to the pointer, keeping the minimum size and the
/// preview bounds. `corner` is `top-left`, `top-right`, `bottom-left` or
/// `bottom-right`.
///
/// # Returns
/// `[x, y, width, height]` of the updated rectangle
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn drag_crop_corner_wasm(
    x: u32,
    y: u32,
    crop_width: u32,
    crop_height: u32,
    corner_name: &str,
    pointer_x: f64,
    pointer_y: f64,
    preview_width: u32,
    preview_height: u32,
) -> Result<Vec<u32>, JsError> {
    let rect = CropRect::new(x, y, crop_width, crop_height).drag_corner(
        corner(corner_name)?,
        pointer_x,
        pointer_y,
        preview_width,
        preview_height,
    );
    Ok(rect_to_vec(rect))
}

#[wasm_bindgen]
pub fn flip_wasm(data: &[u8], width: u32, height: u32, horizontal: bool) -> Result<Vec<u8>, JsError> {
    let axis = if horizontal { Axis::Horizontal } else { Axis::Vertical };
    Ok(flip(&buffer(data, width, height)?, axis).into_raw())
}

// ============================================================================
// Filters
// ============================================================================

/// Apply the slider stack. Values use the slider units (percent, degrees,
/// pixels) and are clamped to their ranges.
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn apply_filters_wasm(
    data: &[u8],
    width: u32,
    height: u32,
    brightness: f32,
    contrast: f32,
    saturation: f32,
    hue: f32,
    blur: f32,
    grayscale: f32,
    sepia: f32,
) -> Result<Vec<u8>, JsError> {
    let state = FilterState {
        brightness,
        contrast,
        saturation,
        hue,
        blur,
        grayscale,
        sepia,
    };
    Ok(apply_filters(&buffer(data, width, height)?, &state)?.into_raw())
}

// ============================================================================
// Encoding
// ============================================================================

/// Decoded image handed back to JavaScript.
#[wasm_bindgen]
pub struct DecodedImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

#[wasm_bindgen]
impl DecodedImage {
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Move the RGBA bytes out; later calls return an empty array.
    #[wasm_bindgen(js_name = takeData)]
    pub fn take_data(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.data)
    }
}

impl From<PixelBuffer> for DecodedImage {
    fn from(buffer: PixelBuffer) -> Self {
        let (width, height) = buffer.dimensions();
        Self {
            width,
            height,
            data: buffer.into_raw(),
        }
    }
}

#[wasm_bindgen]
pub fn encode_png_wasm(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, JsError> {
    Ok(codec::encode_png(&buffer(data, width, height)?)?)
}

#[wasm_bindgen]
pub fn decode_image_wasm(bytes: &[u8]) -> Result<DecodedImage, JsError> {
    Ok(codec::decode_image(bytes)?.into())
}

#[wasm_bindgen]
pub fn to_data_url_wasm(data: &[u8], width: u32, height: u32) -> Result<String, JsError> {
    Ok(codec::buffer_to_data_url(&buffer(data, width, height)?)?)
}

/// Decode a PNG data URL or bare base64 PNG.
#[wasm_bindgen]
pub fn decode_data_url_wasm(text: &str) -> Result<DecodedImage, JsError> {
    Ok(codec::buffer_from_base64(text)?.into())
}

#[wasm_bindgen]
pub fn clean_svg_wasm(text: &str) -> String {
    prompt::clean_svg(text)
}

// ============================================================================
// Editor session
// ============================================================================

/// Stateful image editor behind the panel's crop and filter tools.
#[wasm_bindgen]
pub struct ImageEditor {
    session: EditSession,
}

#[wasm_bindgen]
impl ImageEditor {
    /// Open an editor on PNG (or data URL) bytes.
    #[wasm_bindgen(constructor)]
    pub fn new(data_url: &str, max_preview_width: u32, max_preview_height: u32) -> Result<ImageEditor, JsError> {
        let source = codec::buffer_from_base64(data_url)?;
        Ok(Self {
            session: EditSession::open(source, max_preview_width, max_preview_height),
        })
    }

    #[wasm_bindgen(getter, js_name = previewScale)]
    pub fn preview_scale(&self) -> f64 {
        self.session.preview_scale()
    }

    #[wasm_bindgen(js_name = previewSize)]
    pub fn preview_size(&self) -> Vec<u32> {
        let (w, h) = self.session.preview_size();
        vec![w, h]
    }

    #[wasm_bindgen(js_name = cropRect)]
    pub fn crop_rect(&self) -> Vec<u32> {
        rect_to_vec(self.session.crop_rect())
    }

    #[wasm_bindgen(js_name = dragCorner)]
    pub fn drag_corner(&mut self, corner_name: &str, x: f64, y: f64) -> Result<Vec<u32>, JsError> {
        Ok(rect_to_vec(self.session.drag_corner(corner(corner_name)?, x, y)))
    }

    #[wasm_bindgen(js_name = resetCrop)]
    pub fn reset_crop(&mut self) {
        self.session.reset_crop();
    }

    /// Crop the source; returns the `[x, y, width, height]` used, in source pixels.
    #[wasm_bindgen(js_name = applyCrop)]
    pub fn apply_crop(&mut self) -> Result<Vec<u32>, JsError> {
        Ok(rect_to_vec(self.session.apply_crop()?))
    }

    pub fn flip(&mut self, horizontal: bool) {
        self.session.flip(if horizontal { Axis::Horizontal } else { Axis::Vertical });
    }

    /// Returns the number of pixels made transparent.
    #[wasm_bindgen(js_name = removeBackground)]
    pub fn remove_background(&mut self, hex_color: &str, tolerance: u32, border_connected: bool) -> Result<usize, JsError> {
        let color = Color::from_hex(hex_color)?;
        let result = self
            .session
            .remove_background(color, Tolerance(tolerance), mask_mode(border_connected));
        Ok(result.changed_pixels)
    }

    /// Replace the sliders from a JSON object such as `{"brightness": 20}`.
    #[wasm_bindgen(js_name = setFilters)]
    pub fn set_filters(&mut self, filters_json: &str) -> Result<(), JsError> {
        let state: FilterState = serde_json::from_str(filters_json)?;
        self.session.set_filters(state);
        Ok(())
    }

    /// Filtered preview for the canvas.
    #[wasm_bindgen(js_name = renderPreview)]
    pub fn render_preview(&self) -> Result<DecodedImage, JsError> {
        Ok(self.session.render_preview()?.into())
    }

    /// Filtered full-resolution PNG, ready for upload.
    #[wasm_bindgen(js_name = exportPng)]
    pub fn export_png(&self) -> Result<Vec<u8>, JsError> {
        Ok(self.session.export_png()?)
    }
}
