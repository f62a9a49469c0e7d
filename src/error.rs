//! Error types for the pixel engine.

/// Errors raised by pixel operations and transport encoding.
///
/// Every engine operation returns a fresh buffer, so an error never leaves
/// the caller's source buffer modified.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("buffer length {len} is not a multiple of 4")]
    UnalignedBuffer { len: usize },

    #[error("buffer length {len} does not match {width}x{height} RGBA ({expected} bytes)")]
    DimensionMismatch {
        width: u32,
        height: u32,
        len: usize,
        expected: usize,
    },

    #[error("{width}x{height} RGBA does not fit in memory")]
    TooLarge { width: u32, height: u32 },

    #[error("crop rect {x},{y} {width}x{height} does not fit a {source_width}x{source_height} image")]
    CropOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        source_width: u32,
        source_height: u32,
    },

    #[error("preview scale must be positive and finite, got {0}")]
    InvalidScale(f64),

    #[error("invalid color: {0}")]
    InvalidColor(String),

    #[error("malformed data URL: {0}")]
    MalformedDataUrl(String),

    #[error("image codec error: {0}")]
    Codec(#[from] image::ImageError),

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
