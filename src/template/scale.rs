//! Nearest-neighbour template scaling.

use crate::image::{MaskedTemplate, PixelGrid};
use crate::util::{FftMatchError, FftMatchResult};

/// Returns the output shape `round(h * scale) x round(w * scale)`.
pub fn scaled_shape(height: usize, width: usize, scale: f64) -> (usize, usize) {
    (
        (height as f64 * scale).round() as usize,
        (width as f64 * scale).round() as usize,
    )
}

/// Resamples a template by `scale` with nearest-neighbour lookup.
///
/// Output cell `(i, j)` copies input `(floor(i / scale), floor(j / scale))`,
/// clamped to the last row/column. The mask is all valid. A non-positive or
/// non-finite scale, or one that rounds to an empty output, is rejected.
pub fn scale_nearest(template: &PixelGrid, scale: f64) -> FftMatchResult<MaskedTemplate> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(FftMatchError::DegenerateTransform {
            reason: "scale must be finite and positive",
        });
    }
    let (height, width) = template.shape();
    let (out_h, out_w) = scaled_shape(height, width, scale);
    if out_h == 0 || out_w == 0 {
        return Err(FftMatchError::DegenerateTransform {
            reason: "scaled template has zero area",
        });
    }

    let pixels = template.as_slice();
    let grid = PixelGrid::from_fn(out_h, out_w, |i, j| {
        let r = ((i as f64 / scale) as usize).min(height - 1);
        let c = ((j as f64 / scale) as usize).min(width - 1);
        pixels[r * width + c]
    })?;
    Ok(MaskedTemplate::unmasked(grid))
}
