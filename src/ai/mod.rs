//! Request and response shapes for the Gemini `generateContent` API.
//!
//! The panel calls the model either directly (SVG generation) or through
//! the `/api/gemini` proxy (background removal, translation). Both sides
//! build their JSON bodies here, and both read responses with the same
//! extractors. Model fallback is a plain ordered loop, see [`first_success`].

#[cfg(feature = "proxy")]
pub mod proxy;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::codec::PNG_MIME;

pub const BACKGROUND_REMOVAL_INSTRUCTION: &str = "Remove the background from this image. Output a PNG image with an \
alpha channel where the background pixels have 0% opacity (fully transparent, alpha=0). The subject should remain \
fully opaque. Do not draw a checkerboard pattern - make the background actually transparent using the alpha channel.";

pub const SVG_TEMPERATURE: f64 = 0.9;
pub const SVG_MAX_OUTPUT_TOKENS: u32 = 8192;

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("Invalid action")]
    InvalidAction(String),

    #[error("missing {0} for this action")]
    MissingInput(&'static str),

    #[error("all {} models failed: {}", .0.len(), join_failures(.0))]
    AllModelsFailed(Vec<AttemptFailure>),
}

fn join_failures(failures: &[AttemptFailure]) -> String {
    failures.iter().map(|f| f.to_string()).collect::<Vec<_>>().join("; ")
}

/// Proxied model actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AiAction {
    BackgroundRemoval,
    Translation,
}

impl AiAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AiAction::BackgroundRemoval => "background-removal",
            AiAction::Translation => "translation",
        }
    }
}

impl FromStr for AiAction {
    type Err = AiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "background-removal" => Ok(AiAction::BackgroundRemoval),
            "translation" => Ok(AiAction::Translation),
            other => Err(AiError::InvalidAction(other.to_string())),
        }
    }
}

/// Body of a `POST /api/gemini` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequest {
    /// Model resource name, e.g. `models/gemini-2.5-flash-image`.
    pub model: String,
    pub action: String,
    #[serde(default)]
    pub base64_data: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

impl ProxyRequest {
    pub fn body(&self) -> Result<Value, AiError> {
        let action: AiAction = self.action.parse()?;
        generate_body(action, self.base64_data.as_deref(), self.prompt.as_deref())
    }
}

/// Build the `generateContent` body for a proxied action.
///
/// Background removal sends the fixed instruction plus the image as an
/// inline PNG part; translation sends the caller's prompt as is.
pub fn generate_body(action: AiAction, base64_png: Option<&str>, prompt: Option<&str>) -> Result<Value, AiError> {
    let parts = match action {
        AiAction::BackgroundRemoval => {
            let data = base64_png.ok_or(AiError::MissingInput("base64Data"))?;
            json!([
                { "text": BACKGROUND_REMOVAL_INSTRUCTION },
                { "inline_data": { "mime_type": PNG_MIME, "data": data } }
            ])
        }
        AiAction::Translation => {
            let text = prompt.ok_or(AiError::MissingInput("prompt"))?;
            json!([{ "text": text }])
        }
    };
    Ok(json!({ "contents": [{ "parts": parts }] }))
}

pub fn svg_generation_body(prompt: &str) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "temperature": SVG_TEMPERATURE,
            "maxOutputTokens": SVG_MAX_OUTPUT_TOKENS
        }
    })
}

// ============================================================================
// Response extraction
// ============================================================================

fn first_candidate_parts(response: &Value) -> impl Iterator<Item = &Value> {
    response
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

/// Text of the first part of the first candidate.
pub fn candidate_text(response: &Value) -> Option<&str> {
    response.pointer("/candidates/0/content/parts/0/text").and_then(Value::as_str)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    /// Base64 payload as returned by the API.
    pub data: String,
}

impl InlineImage {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// First inline image among the first candidate's parts.
///
/// The API answers in camelCase, older responses use snake_case; both are read.
pub fn candidate_inline_image(response: &Value) -> Option<InlineImage> {
    first_candidate_parts(response).find_map(|part| {
        let inline = part.get("inlineData").or_else(|| part.get("inline_data"))?;
        let data = inline.get("data")?.as_str()?;
        let mime_type = inline
            .get("mimeType")
            .or_else(|| inline.get("mime_type"))
            .and_then(Value::as_str)
            .unwrap_or(PNG_MIME);
        Some(InlineImage {
            mime_type: mime_type.to_string(),
            data: data.to_string(),
        })
    })
}

/// `error.message` of an API error body.
pub fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value.pointer("/error/message")?.as_str().map(str::to_string)
}

// ============================================================================
// Model fallback
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCandidate {
    pub name: String,
    pub display_name: String,
}

impl ModelCandidate {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
        }
    }

    /// `models/<name>`, the form used in API paths.
    pub fn resource_name(&self) -> String {
        format!("models/{}", self.name)
    }
}

/// SVG generation models, best first.
pub fn svg_models() -> Vec<ModelCandidate> {
    vec![
        ModelCandidate::new("nano-banana-pro-preview", "Nano Banana Pro"),
        ModelCandidate::new("gemini-3-pro-preview", "Gemini 3 Pro"),
        ModelCandidate::new("gemini-2.5-pro", "Gemini 2.5 Pro"),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptFailure {
    pub model: String,
    pub reason: String,
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.model, self.reason)
    }
}

/// Try `attempt` with each candidate in order and return the first success
/// together with the model that produced it.
pub fn first_success<'a, T, E, F>(
    candidates: &'a [ModelCandidate],
    mut attempt: F,
) -> Result<(&'a ModelCandidate, T), AiError>
where
    E: fmt::Display,
    F: FnMut(&ModelCandidate) -> Result<T, E>,
{
    let mut failures = Vec::new();
    for candidate in candidates {
        match attempt(candidate) {
            Ok(output) => {
                tracing::info!(model = %candidate.display_name, "model succeeded");
                return Ok((candidate, output));
            }
            Err(err) => {
                tracing::warn!(model = %candidate.display_name, error = %err, "model failed, trying next");
                failures.push(AttemptFailure {
                    model: candidate.display_name.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }
    Err(AiError::AllModelsFailed(failures))
}
