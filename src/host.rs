//! Capabilities the plugin needs from the design document.
//!
//! The plugin script only talks to the document through [`HostDocument`],
//! so the message flows in [`crate::plugin`] run the same against the real
//! host bindings and against an in-memory document in tests.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(pub String);

impl ShapeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShapeKind {
    Text,
    Rectangle,
    Ellipse,
    Path,
    #[serde(other)]
    Other,
}

/// Position and size on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Frame {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Frame of this size centered on `(cx, cy)`.
    pub fn centered_at(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self::new(cx - width / 2.0, cy - height / 2.0, width, height)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Zero-sized frames do not count toward a selection's bounds.
    pub fn has_area(&self) -> bool {
        self.width != 0.0 && self.height != 0.0
    }
}

/// Uploaded image asset referenced by a fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fill {
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub image: Option<ImageRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stroke {
    #[serde(default)]
    pub color: Option<String>,
}

/// Read-only snapshot of a document shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeInfo {
    pub id: ShapeId,
    pub kind: ShapeKind,
    #[serde(default)]
    pub name: String,
    pub frame: Frame,
    #[serde(default)]
    pub fills: Vec<Fill>,
    #[serde(default)]
    pub strokes: Vec<Stroke>,
}

impl ShapeInfo {
    /// First image fill of a rectangle, the only shape the image tools edit.
    pub fn image_fill(&self) -> Option<&ImageRef> {
        if self.kind != ShapeKind::Rectangle {
            return None;
        }
        self.fills.iter().find_map(|fill| fill.image.as_ref())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("shape not found: {0}")]
    ShapeNotFound(ShapeId),

    #[error("export failed: {0}")]
    Export(String),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("failed to create shape: {0}")]
    Create(String),

    #[error("shape {0} is not a text shape")]
    NotText(ShapeId),
}

pub type HostResult<T> = std::result::Result<T, HostError>;

/// The design document as seen by the plugin.
pub trait HostDocument {
    /// Current selection, in selection order.
    fn selection(&self) -> Vec<ShapeInfo>;

    fn viewport_center(&self) -> (f64, f64);

    /// Render a shape to PNG at `scale`, with strokes and corner radius
    /// removed for the duration of the export.
    fn export_raster(&mut self, shape: &ShapeId, scale: f64) -> HostResult<Vec<u8>>;

    /// Upload PNG bytes as a named asset and create a borderless rectangle
    /// filled with it.
    fn upload_raster_fill(&mut self, name: &str, png: &[u8]) -> HostResult<ShapeId>;

    /// Resize and move a shape.
    fn place(&mut self, shape: &ShapeId, frame: Frame) -> HostResult<()>;

    fn rename(&mut self, shape: &ShapeId, name: &str) -> HostResult<()>;

    fn select(&mut self, shapes: &[ShapeId]);

    /// Characters of a text shape, `None` for other shapes.
    fn read_text(&self, shape: &ShapeId) -> Option<String>;

    fn write_text(&mut self, shape: &ShapeId, text: &str) -> HostResult<()>;

    /// Create a group from SVG markup and return it as placed by the host.
    fn create_from_svg(&mut self, svg: &str) -> HostResult<ShapeInfo>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_with_fills(fills: Vec<Fill>) -> ShapeInfo {
        ShapeInfo {
            id: ShapeId::new("r1"),
            kind: ShapeKind::Rectangle,
            name: "Rect".into(),
            frame: Frame::new(0.0, 0.0, 10.0, 10.0),
            fills,
            strokes: vec![],
        }
    }

    #[test]
    fn test_image_fill_only_on_rectangles() {
        let image = ImageRef { id: "asset".into(), name: "photo.png".into() };
        let fills = vec![
            Fill { color: Some("#ff0000".into()), image: None },
            Fill { color: None, image: Some(image.clone()) },
        ];

        let mut shape = rect_with_fills(fills);
        assert_eq!(shape.image_fill(), Some(&image));

        shape.kind = ShapeKind::Ellipse;
        assert_eq!(shape.image_fill(), None);

        assert_eq!(rect_with_fills(vec![Fill::default()]).image_fill(), None);
    }

    #[test]
    fn test_frame_centered() {
        let frame = Frame::centered_at(100.0, 50.0, 40.0, 20.0);
        assert_eq!(frame, Frame::new(80.0, 40.0, 40.0, 20.0));
        assert_eq!(frame.right(), 120.0);
        assert_eq!(frame.bottom(), 60.0);
        assert!(!Frame::new(1.0, 1.0, 0.0, 5.0).has_area());
    }

    #[test]
    fn test_shape_kind_json() {
        let kind: ShapeKind = serde_json::from_str("\"text\"").unwrap();
        assert_eq!(kind, ShapeKind::Text);
        let kind: ShapeKind = serde_json::from_str("\"board\"").unwrap();
        assert_eq!(kind, ShapeKind::Other);
    }
}
