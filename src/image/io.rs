//! Convenience helpers for loading pixel grids via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::PixelGrid;
use crate::util::{FftMatchError, FftMatchResult};
use std::path::Path;

/// Copies a grayscale image buffer into a pixel grid.
pub fn grid_from_gray_image(img: &image::GrayImage) -> FftMatchResult<PixelGrid> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    PixelGrid::new(img.as_raw().clone(), height, width)
}

/// Converts any decoded image to luma and copies it into a pixel grid.
pub fn grid_from_dynamic_image(img: &image::DynamicImage) -> FftMatchResult<PixelGrid> {
    let gray = img.to_luma8();
    grid_from_gray_image(&gray)
}

/// Loads an image from disk and converts it to a grayscale pixel grid.
pub fn load_gray_image<P: AsRef<Path>>(path: P) -> FftMatchResult<PixelGrid> {
    let img = image::open(path).map_err(|err| FftMatchError::ImageIo {
        reason: err.to_string(),
    })?;
    grid_from_dynamic_image(&img)
}
