//! Prompt text for SVG generation.
//!
//! Two inputs shape a prompt: the user's generation options from the panel
//! and a [`SelectionContext`] derived from whatever is selected in the
//! document, so new designs can follow the existing style.

use serde::{Deserialize, Serialize};

use crate::host::{ShapeInfo, ShapeKind};

pub const DEFAULT_SVG_SIZE: (u32, u32) = (500, 500);

// ============================================================================
// Selection context
// ============================================================================

/// Style summary of the current selection, sent to the panel on every
/// selection change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionContext {
    pub context: String,
    pub width: f64,
    pub height: f64,
    pub svg: String,
}

impl Default for SelectionContext {
    fn default() -> Self {
        Self {
            context: String::new(),
            width: DEFAULT_SVG_SIZE.0 as f64,
            height: DEFAULT_SVG_SIZE.1 as f64,
            svg: String::new(),
        }
    }
}

impl SelectionContext {
    pub fn analyze(selection: &[ShapeInfo]) -> Self {
        if selection.is_empty() {
            return Self::default();
        }

        let mut colors: Vec<&str> = Vec::new();
        let mut families: Vec<&str> = Vec::new();
        let mut has_text = false;
        let mut fill_count = 0usize;
        let mut stroke_count = 0usize;
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);

        for shape in selection {
            let frame = &shape.frame;
            if frame.has_area() {
                min_x = min_x.min(frame.x);
                min_y = min_y.min(frame.y);
                max_x = max_x.max(frame.right());
                max_y = max_y.max(frame.bottom());
            }

            for color in shape.fills.iter().filter_map(|f| f.color.as_deref()) {
                push_unique(&mut colors, color);
                fill_count += 1;
            }
            for color in shape.strokes.iter().filter_map(|s| s.color.as_deref()) {
                push_unique(&mut colors, color);
                stroke_count += 1;
            }

            match shape.kind {
                ShapeKind::Text => has_text = true,
                ShapeKind::Rectangle => push_unique(&mut families, "rectangles"),
                ShapeKind::Ellipse => push_unique(&mut families, "circles/ellipses"),
                ShapeKind::Path => push_unique(&mut families, "custom paths"),
                ShapeKind::Other => {}
            }
        }

        tracing::debug!(
            selected = selection.len(),
            fill_count,
            stroke_count,
            colors = colors.len(),
            shapes = families.len(),
            "selection analyzed"
        );

        let has_fills = fill_count > 0;
        let has_strokes = stroke_count > 0;
        let mut context = String::new();

        if has_strokes && !has_fills {
            context.push_str(
                "IMPORTANT STYLE: Create a SIMPLE LINE DRAWING with outlines only, NO FILLS. Use minimalist line art style. ",
            );
        } else if !has_strokes && has_fills {
            context.push_str("STYLE: Use solid filled shapes without outlines. ");
        } else if stroke_count > fill_count * 2 {
            context.push_str("IMPORTANT STYLE: Emphasize line work and outlines over fills. Keep it minimal. ");
        } else if !has_strokes && !has_fills && !families.is_empty() {
            context.push_str(
                "IMPORTANT STYLE: Create a SIMPLE LINE DRAWING with clean outlines. Use minimalist line art style with NO FILLS. ",
            );
        }

        if !colors.is_empty() {
            context.push_str(&format!("Use these colors: {}. ", colors.join(", ")));
        }
        if !families.is_empty() {
            context.push_str(&format!("Incorporate similar shapes like {}. ", families.join(", ")));
        }
        if has_text {
            context.push_str("Include text elements in the design. ");
        }
        if context.is_empty() {
            let n = selection.len();
            context = format!("{n} element{} selected. ", if n > 1 { "s" } else { "" });
        }

        let width = if max_x > min_x { (max_x - min_x).round() } else { DEFAULT_SVG_SIZE.0 as f64 };
        let height = if max_y > min_y { (max_y - min_y).round() } else { DEFAULT_SVG_SIZE.1 as f64 };

        Self {
            context,
            width,
            height,
            svg: String::new(),
        }
    }
}

fn push_unique<'a>(items: &mut Vec<&'a str>, item: &'a str) {
    if !items.contains(&item) {
        items.push(item);
    }
}

// ============================================================================
// Generation options
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    Vibrant,
    Pastel,
    Monochrome,
    Warm,
    Cool,
    Earth,
    Neon,
    Grayscale,
}

impl ColorScheme {
    pub fn phrase(self) -> &'static str {
        match self {
            ColorScheme::Vibrant => "with vibrant, bold colors",
            ColorScheme::Pastel => "using soft pastel colors",
            ColorScheme::Monochrome => "in monochrome (single color variations)",
            ColorScheme::Warm => "with warm tones (reds, oranges, yellows)",
            ColorScheme::Cool => "with cool tones (blues, purples, greens)",
            ColorScheme::Earth => "using earth tones (browns, greens, tans)",
            ColorScheme::Neon => "with bright neon colors",
            ColorScheme::Grayscale => "in grayscale (black, white, and grays only)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    #[default]
    Balanced,
    Detailed,
}

/// Choices from the generation form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationOptions {
    /// Free-form style preset, e.g. "flat" or "isometric".
    pub style: Option<String>,
    pub color_scheme: Option<ColorScheme>,
    pub complexity: Complexity,
    pub gradients: bool,
    pub shadows: bool,
    pub texture: bool,
}

impl GenerationOptions {
    /// Append the chosen options to a design description.
    pub fn enhance(&self, description: &str) -> String {
        let mut prompt = description.to_string();

        if let Some(style) = self.style.as_deref().filter(|s| !s.is_empty()) {
            prompt.push_str(&format!(", in {style} style"));
        }
        if let Some(scheme) = self.color_scheme {
            prompt.push(' ');
            prompt.push_str(scheme.phrase());
        }
        match self.complexity {
            Complexity::Simple => prompt.push_str(", keep it simple and clean with minimal elements"),
            Complexity::Detailed => prompt.push_str(", make it detailed and intricate with many elements"),
            Complexity::Balanced => {}
        }

        let elements: Vec<&str> = [
            (self.gradients, "use gradients"),
            (self.shadows, "include shadows and depth"),
            (self.texture, "add texture effects"),
        ]
        .into_iter()
        .filter_map(|(on, text)| on.then_some(text))
        .collect();
        if !elements.is_empty() {
            prompt.push_str(&format!(", {}", elements.join(", ")));
        }

        prompt
    }
}

// ============================================================================
// SVG prompt and response cleanup
// ============================================================================

pub fn svg_prompt(description: &str, width: u32, height: u32) -> String {
    format!(
        "Generate a complete, valid SVG image based on this description: \"{description}\". \n\
         \n\
         CRITICAL REQUIREMENTS:\n\
         - Output ONLY the SVG code, starting with <svg> and ending with </svg>\n\
         - Set width=\"{width}\" height=\"{height}\"\n\
         - Use viewBox=\"0 0 {width} {height}\" for scalability\n\
         - Make it visually appealing and professional\n\
         - Follow the style and color preferences specified\n\
         - Use creative shapes, paths, and visual elements\n\
         - Do not include any explanation, markdown formatting, or code blocks\n\
         - Just pure SVG XML code that starts with <svg and ends with </svg>"
    )
}

/// Strip markdown code fences around model output.
pub fn clean_svg(text: &str) -> String {
    let mut out = text.trim().to_string();
    for fence in ["```svg", "```"] {
        while let Some(start) = out.find(fence) {
            let mut end = start + fence.len();
            if out[end..].starts_with('\n') {
                end += 1;
            }
            out.replace_range(start..end, "");
        }
    }
    out.trim().to_string()
}

/// Parse a `WIDTHxHEIGHT` size option, falling back to 500x500.
pub fn parse_size(size: &str) -> (u32, u32) {
    size.split_once('x')
        .and_then(|(w, h)| Some((w.trim().parse().ok()?, h.trim().parse().ok()?)))
        .unwrap_or(DEFAULT_SVG_SIZE)
}
