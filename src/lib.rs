//! Penpot AI Designer engine
//!
//! Pixel operations behind the plugin's image tools, the host-side message
//! handling, prompt building and the Gemini request plumbing.
//!
//! ## Image Format
//! Every image is a [`PixelBuffer`]: tightly packed RGBA8, row-major, no
//! premultiplied alpha. Filter kernels view it as an ndarray of shape
//! (height, width, 4).
//!
//! ## Layout
//! - [`selection`], [`transform`], [`filters`]: pure buffer-in, buffer-out operations
//! - [`codec`]: PNG, base64 and data URLs
//! - [`session`]: one image being edited in the panel
//! - [`host`], [`protocol`], [`plugin`]: the host script and its messages
//! - [`prompt`], [`ai`]: SVG generation prompts, Gemini bodies, the proxy (`proxy` feature)
//! - `wasm`: JavaScript bindings (`wasm` feature)

pub mod ai;
pub mod buffer;
pub mod codec;
pub mod error;
pub mod filters;
pub mod host;
pub mod plugin;
pub mod prompt;
pub mod protocol;
pub mod selection;
pub mod session;
pub mod transform;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use buffer::{Color, PixelBuffer, Tolerance};
pub use error::{EngineError, Result};
pub use filters::{apply_filters, FilterState};
pub use selection::{remove_background, MaskMode};
pub use session::EditSession;
pub use transform::{crop, flip, Axis, CropRect};
