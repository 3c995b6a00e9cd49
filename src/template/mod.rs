//! Geometric template transforms.
//!
//! Each transform returns a [`MaskedTemplate`](crate::image::MaskedTemplate)
//! whose mask marks the pixels that carry template content.

pub mod rotate;
pub mod scale;

pub use rotate::{rotate_bilinear, rotated_origin};
pub use scale::{scale_nearest, scaled_shape};
