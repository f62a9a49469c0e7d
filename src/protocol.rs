//! Messages exchanged between the panel and the host script.
//!
//! Both directions are JSON objects discriminated by a kebab-case `type`
//! field; payload fields are camelCase. Replies from the host script carry
//! `source: "penpot"` so the panel can tell them from other window messages.

use serde::{Deserialize, Serialize};

use crate::host::ShapeId;

pub const HOST_SOURCE: &str = "penpot";

/// Panel to host script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum UiMessage {
    #[serde(alias = "insert-svg", rename_all = "camelCase")]
    ImportSvg {
        #[serde(default)]
        svg: Option<String>,
        #[serde(default)]
        content: Option<String>,
        #[serde(default)]
        offset_x: Option<f64>,
    },
    /// One rasterized PDF page as PNG bytes.
    #[serde(rename_all = "camelCase")]
    ImportPdfPage {
        data: Vec<u8>,
        page_num: u32,
        width: f64,
        height: f64,
    },
    GetSelectedText,
    ReplaceText {
        text: String,
    },
    GetSelectedImage,
    /// Cropped PNG plus the crop offset inside the original shape.
    #[serde(rename_all = "camelCase")]
    UploadCroppedImage {
        image_data: Vec<u8>,
        width: f64,
        height: f64,
        #[serde(default)]
        original_x: f64,
        #[serde(default)]
        original_y: f64,
    },
    GetImageForBgRemoval,
    #[serde(rename_all = "camelCase")]
    UploadBgRemovedImage {
        image_data: Vec<u8>,
        width: f64,
        height: f64,
    },
}

impl UiMessage {
    /// SVG markup of an import message, from either field.
    pub fn svg_content(&self) -> Option<&str> {
        match self {
            UiMessage::ImportSvg { svg, content, .. } => svg
                .as_deref()
                .filter(|s| !s.is_empty())
                .or(content.as_deref().filter(|s| !s.is_empty())),
            _ => None,
        }
    }
}

/// Image shape handed to the panel's editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedImage {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub image_name: String,
    pub image_asset_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_scale: Option<f64>,
}

/// Host script to panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PluginMessage {
    SelectionContext {
        context: String,
        width: f64,
        height: f64,
        svg: String,
    },
    ImportSuccess,
    ImportError {
        error: String,
    },
    #[serde(rename_all = "camelCase")]
    SelectedText {
        text: String,
        shape_id: String,
    },
    #[serde(rename_all = "camelCase")]
    SelectedImage {
        image_data: Option<SelectedImage>,
        shape_id: Option<ShapeId>,
    },
    CropSuccess,
    CropError {
        error: String,
    },
    #[serde(rename_all = "camelCase")]
    ImageForBgRemoval {
        image_data: Option<String>,
        shape_id: Option<ShapeId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<f64>,
    },
    BgRemovalSuccess,
    BgRemovalError {
        error: String,
    },
    #[serde(rename = "themechange")]
    ThemeChange {
        theme: String,
    },
}

/// A [`PluginMessage`] as posted to the panel window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginEnvelope {
    pub source: String,
    #[serde(flatten)]
    pub message: PluginMessage,
}

impl From<PluginMessage> for PluginEnvelope {
    fn from(message: PluginMessage) -> Self {
        Self {
            source: HOST_SOURCE.to_string(),
            message,
        }
    }
}

impl PluginEnvelope {
    pub fn is_from_host(&self) -> bool {
        self.source == HOST_SOURCE
    }
}
