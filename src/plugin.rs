//! Host-side message handling.
//!
//! [`PluginHandler`] answers [`UiMessage`]s from the panel by acting on a
//! [`HostDocument`] and returns the reply to post back, if any. Failures of
//! an upload or import become `*-error` replies. An empty or unsuitable
//! selection is not an error: the reply carries nulls or empty strings.

use crate::codec::{decode_image, to_png_data_url};
use crate::host::{Frame, HostDocument, HostError, ImageRef, ShapeInfo, ShapeKind};
use crate::prompt::SelectionContext;
use crate::protocol::{PluginEnvelope, PluginMessage, SelectedImage, UiMessage};

/// Vertical gap between stacked PDF pages.
pub const PDF_PAGE_GAP: f64 = 50.0;
pub const CROPPED_IMAGE_NAME: &str = "Cropped Image";
pub const BG_REMOVED_IMAGE_NAME: &str = "Background Removed";
/// Exports for the editor are taken at full resolution.
pub const EXPORT_SCALE: f64 = 1.0;

#[derive(Debug, thiserror::Error)]
enum FlowError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error("invalid image data: {0}")]
    Image(#[from] crate::error::EngineError),

    #[error("No SVG content provided")]
    NoSvgContent,

    #[error("No shape selected")]
    NothingSelected,
}

pub struct PluginHandler<H> {
    host: H,
}

impl<H: HostDocument> PluginHandler<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// Reply for a selection change, also sent once at startup.
    pub fn selection_changed(&self) -> PluginEnvelope {
        let ctx = SelectionContext::analyze(&self.host.selection());
        PluginMessage::SelectionContext {
            context: ctx.context,
            width: ctx.width,
            height: ctx.height,
            svg: ctx.svg,
        }
        .into()
    }

    pub fn theme_changed(&self, theme: &str) -> PluginEnvelope {
        PluginMessage::ThemeChange { theme: theme.to_string() }.into()
    }

    /// Handle one panel message. `None` means nothing is posted back.
    pub fn handle(&mut self, message: UiMessage) -> Option<PluginEnvelope> {
        let svg = message.svg_content().map(str::to_string);
        let reply = match message {
            UiMessage::ImportSvg { offset_x, .. } => {
                Some(match self.import_svg(svg.as_deref(), offset_x.unwrap_or(0.0)) {
                    Ok(()) => PluginMessage::ImportSuccess,
                    Err(err) => {
                        tracing::warn!(error = %err, "SVG import failed");
                        PluginMessage::ImportError { error: err.to_string() }
                    }
                })
            }
            UiMessage::ImportPdfPage { data, page_num, width, height } => {
                match self.import_pdf_page(&data, page_num, width, height) {
                    Ok(()) => None,
                    Err(err) => {
                        tracing::warn!(page_num, error = %err, "PDF page import failed");
                        Some(PluginMessage::ImportError { error: err.to_string() })
                    }
                }
            }
            UiMessage::GetSelectedText => Some(self.selected_text()),
            UiMessage::ReplaceText { text } => {
                self.replace_text(&text);
                None
            }
            UiMessage::GetSelectedImage => Some(self.selected_image()),
            UiMessage::UploadCroppedImage { image_data, width, height, original_x, original_y } => {
                Some(match self.upload_replacement(&image_data, CROPPED_IMAGE_NAME, width, height, (original_x, original_y)) {
                    Ok(()) => PluginMessage::CropSuccess,
                    Err(err) => {
                        tracing::warn!(error = %err, "cropped image upload failed");
                        PluginMessage::CropError { error: err.to_string() }
                    }
                })
            }
            UiMessage::GetImageForBgRemoval => Some(self.image_for_bg_removal()),
            UiMessage::UploadBgRemovedImage { image_data, width, height } => {
                Some(match self.upload_replacement(&image_data, BG_REMOVED_IMAGE_NAME, width, height, (0.0, 0.0)) {
                    Ok(()) => PluginMessage::BgRemovalSuccess,
                    Err(err) => {
                        tracing::warn!(error = %err, "background-removed image upload failed");
                        PluginMessage::BgRemovalError { error: err.to_string() }
                    }
                })
            }
        };
        reply.map(PluginEnvelope::from)
    }

    fn first_selected(&self) -> Option<ShapeInfo> {
        self.host.selection().into_iter().next()
    }

    fn import_svg(&mut self, svg: Option<&str>, offset_x: f64) -> Result<(), FlowError> {
        let svg = svg.ok_or(FlowError::NoSvgContent)?;
        let shape = self.host.create_from_svg(svg)?;
        let (cx, cy) = self.host.viewport_center();
        let mut frame = Frame::centered_at(cx, cy, shape.frame.width, shape.frame.height);
        frame.x += offset_x;
        self.host.place(&shape.id, frame)?;
        self.host.select(&[shape.id]);
        Ok(())
    }

    fn import_pdf_page(&mut self, png: &[u8], page_num: u32, width: f64, height: f64) -> Result<(), FlowError> {
        let name = format!("PDF Page {page_num}");
        let id = self.host.upload_raster_fill(&name, png)?;
        let (cx, cy) = self.host.viewport_center();
        let mut frame = Frame::centered_at(cx, cy, width, height);
        frame.y += f64::from(page_num.saturating_sub(1)) * (height + PDF_PAGE_GAP);
        self.host.place(&id, frame)?;
        self.host.rename(&id, &name)?;
        self.host.select(&[id]);
        Ok(())
    }

    fn selected_text(&self) -> PluginMessage {
        let text = self
            .first_selected()
            .filter(|shape| shape.kind == ShapeKind::Text)
            .map(|shape| {
                let text = self.host.read_text(&shape.id).unwrap_or_default();
                (text, shape.id.0)
            });
        let (text, shape_id) = text.unwrap_or_default();
        PluginMessage::SelectedText { text, shape_id }
    }

    fn replace_text(&mut self, text: &str) {
        let Some(shape) = self.first_selected().filter(|s| s.kind == ShapeKind::Text) else {
            return;
        };
        if let Err(err) = self.host.write_text(&shape.id, text) {
            tracing::warn!(shape = %shape.id, error = %err, "text replacement failed");
        }
    }

    /// First selected rectangle with an image fill, exported as a data URL.
    fn export_selected_image(&mut self) -> Option<(ShapeInfo, ImageRef, Result<String, HostError>)> {
        let shape = self.first_selected()?;
        let image = shape.image_fill()?.clone();
        let exported = self
            .host
            .export_raster(&shape.id, EXPORT_SCALE)
            .and_then(|png| {
                if png.is_empty() {
                    Err(HostError::Export("empty export".to_string()))
                } else {
                    Ok(to_png_data_url(&png))
                }
            });
        Some((shape, image, exported))
    }

    fn selected_image(&mut self) -> PluginMessage {
        let Some((shape, image, exported)) = self.export_selected_image() else {
            return PluginMessage::SelectedImage { image_data: None, shape_id: None };
        };

        let (data_url, preview_scale) = match exported {
            Ok(url) => (Some(url), Some(EXPORT_SCALE)),
            Err(err) => {
                tracing::warn!(shape = %shape.id, error = %err, "preview export failed");
                (None, None)
            }
        };

        PluginMessage::SelectedImage {
            image_data: Some(SelectedImage {
                x: shape.frame.x,
                y: shape.frame.y,
                width: shape.frame.width,
                height: shape.frame.height,
                image_name: image.name,
                image_asset_id: image.id,
                data_url,
                preview_scale,
            }),
            shape_id: Some(shape.id.clone()),
        }
    }

    fn image_for_bg_removal(&mut self) -> PluginMessage {
        match self.export_selected_image() {
            Some((shape, _, Ok(url))) => PluginMessage::ImageForBgRemoval {
                image_data: Some(url),
                shape_id: Some(shape.id),
                width: Some(shape.frame.width),
                height: Some(shape.frame.height),
            },
            other => {
                if let Some((shape, _, Err(err))) = other {
                    tracing::warn!(shape = %shape.id, error = %err, "export for background removal failed");
                }
                PluginMessage::ImageForBgRemoval {
                    image_data: None,
                    shape_id: None,
                    width: None,
                    height: None,
                }
            }
        }
    }

    /// Upload an edited image as a new shape over the selected original.
    fn upload_replacement(
        &mut self,
        png: &[u8],
        name: &str,
        width: f64,
        height: f64,
        (dx, dy): (f64, f64),
    ) -> Result<(), FlowError> {
        let original = self.first_selected().ok_or(FlowError::NothingSelected)?;
        let decoded = decode_image(png)?;
        tracing::debug!(name, bytes = png.len(), dims = ?decoded.dimensions(), "uploading edited image");

        let id = self.host.upload_raster_fill(name, png)?;
        let frame = Frame::new(original.frame.x + dx, original.frame.y + dy, width, height);
        self.host.place(&id, frame)?;
        self.host.rename(&id, name)?;
        self.host.select(&[id]);
        Ok(())
    }
}

impl<H: HostDocument> From<H> for PluginHandler<H> {
    fn from(host: H) -> Self {
        Self::new(host)
    }
}
