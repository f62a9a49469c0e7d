//! Pixel selection for the background tool.
//!
//! - **Global mask**: every pixel close to the reference color
//! - **Border-connected mask**: flood fill from the image border, so
//!   matching pixels inside the subject are kept

pub mod background;

pub use background::{remove_background, remove_background_detailed, BackgroundRemoval, MaskMode};
