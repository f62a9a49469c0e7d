//! Geometry transforms: crop extraction and mirroring.
//!
//! Both copy pixels verbatim; nothing is resampled.

pub mod crop;
pub mod flip;

pub use crop::{crop, fit_scale, scaled_size, Corner, CropRect, MIN_CROP_SIZE};
pub use flip::{flip, Axis};
