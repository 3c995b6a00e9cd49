//! Bilinear template rotation with validity mask and tight cropping.

use crate::image::{MaskedTemplate, PixelGrid, ValidityMask};
use std::f64::consts::{FRAC_PI_2, PI};

use crate::util::math::wrap_rad;
use crate::util::{FftMatchError, FftMatchResult};

/// Rotates a template by `angle_rad` using bilinear sampling.
///
/// The template centre is placed at the middle of a square canvas of side
/// `2 * max(height, width)`, large enough to hold any rotation. Each canvas
/// cell is mapped back about the template centre `((h - 1) / 2, (w - 1) / 2)`:
///
/// ```text
/// src_row = cy + dr * cos - dc * sin
/// src_col = cx + dr * sin + dc * cos
/// ```
///
/// Cells that land inside the template (with a 1e-6 tolerance) are
/// interpolated, rounded and marked valid; the rest stay 0 and invalid. The
/// result is cropped to the bounding box of valid cells. Angle 0 reproduces
/// the input exactly with an all-valid mask.
pub fn rotate_bilinear(template: &PixelGrid, angle_rad: f64) -> FftMatchResult<MaskedTemplate> {
    if !angle_rad.is_finite() {
        return Err(FftMatchError::DegenerateTransform {
            reason: "rotation angle must be finite",
        });
    }

    let (height, width) = template.shape();
    let side = 2 * height.max(width);
    let cy = (height as f64 - 1.0) * 0.5;
    let cx = (width as f64 - 1.0) * 0.5;
    let max_r = height as f64 - 1.0;
    let max_c = width as f64 - 1.0;
    let (sin_a, cos_a) = wrap_rad(angle_rad).sin_cos();
    let epsilon = 1e-6;

    // Near quarter turns the template's row and column extents swap, so the
    // pivot's half-pixel offsets swap too; this keeps multiples of 90 degrees
    // aligned with the pixel grid.
    let (frac_r, frac_c) = if sin_a.abs() > cos_a.abs() {
        (cx.fract(), cy.fract())
    } else {
        (cy.fract(), cx.fract())
    };
    let pivot_r = (side / 2) as f64 + frac_r;
    let pivot_c = (side / 2) as f64 + frac_c;

    let mut pixels = vec![0u8; side * side];
    let mut valid = vec![false; side * side];
    let (mut top, mut bottom, mut left, mut right) = (side, 0usize, side, 0usize);

    for r in 0..side {
        let dr = r as f64 - pivot_r;
        for c in 0..side {
            let dc = c as f64 - pivot_c;
            let src_r = cy + dr * cos_a - dc * sin_a;
            let src_c = cx + dr * sin_a + dc * cos_a;
            if src_r < -epsilon
                || src_c < -epsilon
                || src_r > max_r + epsilon
                || src_c > max_c + epsilon
            {
                continue;
            }

            let idx = r * side + c;
            pixels[idx] =
                sample_bilinear(template, src_r.clamp(0.0, max_r), src_c.clamp(0.0, max_c));
            valid[idx] = true;
            top = top.min(r);
            bottom = bottom.max(r);
            left = left.min(c);
            right = right.max(c);
        }
    }

    // The template centre always maps into bounds, so the box is non-empty.
    let out_h = bottom - top + 1;
    let out_w = right - left + 1;
    let grid = PixelGrid::from_fn(out_h, out_w, |r, c| pixels[(top + r) * side + left + c])?;
    let mask = ValidityMask::from_fn(out_h, out_w, |r, c| valid[(top + r) * side + left + c])?;
    MaskedTemplate::new(grid, mask)
}

/// Returns where the template's own top-left pixel lands inside the
/// bounding box of a template rotated by `angle_rad`.
///
/// The corner sits on the edge the rotation turns it toward: the top edge in
/// the first quarter turn, then the right, bottom and left edges. The first
/// valid cell along that edge is taken.
pub fn rotated_origin(mask: &ValidityMask, angle_rad: f64) -> (usize, usize) {
    let (height, width) = mask.shape();
    if height == 0 || width == 0 {
        return (0, 0);
    }
    let last_r = height - 1;
    let last_c = width - 1;
    let angle = wrap_rad(angle_rad);
    let first = |len: usize, valid: &dyn Fn(usize) -> bool| (0..len).find(|&i| valid(i));

    if angle < FRAC_PI_2 {
        (0, first(width, &|c| mask.is_valid(0, c)).unwrap_or(0))
    } else if angle < PI {
        (first(height, &|r| mask.is_valid(r, last_c)).unwrap_or(0), last_c)
    } else if angle < 1.5 * PI {
        (last_r, first(width, &|c| mask.is_valid(last_r, c)).unwrap_or(0))
    } else {
        (first(height, &|r| mask.is_valid(r, 0)).unwrap_or(0), 0)
    }
}

fn sample_bilinear(grid: &PixelGrid, row: f64, col: f64) -> u8 {
    let (height, width) = grid.shape();
    let pixels = grid.as_slice();
    let r0 = row.floor() as usize;
    let c0 = col.floor() as usize;
    let r1 = (r0 + 1).min(height - 1);
    let c1 = (c0 + 1).min(width - 1);
    let fr = row - r0 as f64;
    let fc = col - c0 as f64;

    let a = f64::from(pixels[r0 * width + c0]);
    let b = f64::from(pixels[r0 * width + c1]);
    let c = f64::from(pixels[r1 * width + c0]);
    let d = f64::from(pixels[r1 * width + c1]);

    let value =
        a * (1.0 - fr) * (1.0 - fc) + b * (1.0 - fr) * fc + c * fr * (1.0 - fc) + d * fr * fc;
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::{rotate_bilinear, rotated_origin};
    use crate::image::{PixelGrid, ValidityMask};
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

    fn ramp(height: usize, width: usize) -> PixelGrid {
        PixelGrid::from_fn(height, width, |r, c| (10 + r * 12 + c * 5) as u8).unwrap()
    }

    #[test]
    fn zero_angle_is_identity() {
        let tpl = ramp(5, 8);
        let rotated = rotate_bilinear(&tpl, 0.0).unwrap();
        assert_eq!(rotated.grid(), &tpl);
        assert_eq!(rotated.valid_count(), 40);

        let full_turn = rotate_bilinear(&tpl, TAU).unwrap();
        assert_eq!(full_turn.grid(), &tpl);
    }

    #[test]
    fn quarter_turn_swaps_dimensions() {
        let tpl = ramp(4, 7);
        let rotated = rotate_bilinear(&tpl, FRAC_PI_2).unwrap();
        assert_eq!(rotated.grid().shape(), (7, 4));
        assert_eq!(rotated.valid_count(), 28);
    }

    #[test]
    fn half_turn_reverses_pixels() {
        let tpl = ramp(3, 4);
        let rotated = rotate_bilinear(&tpl, PI).unwrap();
        assert_eq!(rotated.grid().shape(), (3, 4));
        for r in 0..3 {
            for c in 0..4 {
                assert_eq!(rotated.grid().get(r, c), tpl.get(2 - r, 3 - c));
            }
        }
    }

    #[test]
    fn diagonal_rotation_masks_corners_and_crops_tightly() {
        let tpl = PixelGrid::filled(10, 10, 200).unwrap();
        let rotated = rotate_bilinear(&tpl, FRAC_PI_4).unwrap();
        let (h, w) = rotated.grid().shape();
        assert!(h > 10 && h <= 15, "height {h}");
        assert!(w > 10 && w <= 15, "width {w}");

        let mask = rotated.mask();
        assert!(!mask.is_valid(0, 0));
        assert!(!mask.is_valid(h - 1, w - 1));
        assert!(mask.is_valid(h / 2, w / 2));
        assert!((0..h).any(|r| mask.is_valid(r, 0)));
        assert!((0..w).any(|c| mask.is_valid(0, c)));
        assert!((0..h).any(|r| mask.is_valid(r, w - 1)));
        assert!((0..w).any(|c| mask.is_valid(h - 1, c)));

        for r in 0..h {
            for c in 0..w {
                let value = rotated.grid().get(r, c).unwrap();
                if mask.is_valid(r, c) {
                    assert_eq!(value, 200);
                } else {
                    assert_eq!(value, 0);
                }
            }
        }
    }

    #[test]
    fn origin_follows_the_template_corner() {
        let tpl = ramp(4, 7);
        let at = |angle: f64| {
            let rotated = rotate_bilinear(&tpl, angle).unwrap();
            let origin = rotated_origin(rotated.mask(), angle);
            (origin, rotated.grid().get(origin.0, origin.1).unwrap())
        };
        let corner = tpl.get(0, 0).unwrap();

        assert_eq!(at(0.0), ((0, 0), corner));
        assert_eq!(at(FRAC_PI_2), ((0, 3), corner));
    }

    #[test]
    fn origin_picks_first_valid_cell_on_the_edge() {
        let mask = ValidityMask::from_fn(5, 5, |r, c| r.abs_diff(2) + c.abs_diff(2) <= 2).unwrap();
        assert_eq!(rotated_origin(&mask, FRAC_PI_4), (0, 2));
        assert_eq!(rotated_origin(&mask, 3.0 * FRAC_PI_4), (2, 4));
        assert_eq!(rotated_origin(&mask, 5.0 * FRAC_PI_4), (4, 2));
        assert_eq!(rotated_origin(&mask, 7.0 * FRAC_PI_4), (2, 0));
        assert_eq!(rotated_origin(&mask, -FRAC_PI_4), (2, 0));
    }

    #[test]
    fn non_finite_angle_is_rejected() {
        let tpl = ramp(3, 3);
        assert!(rotate_bilinear(&tpl, f64::NAN).is_err());
        assert!(rotate_bilinear(&tpl, f64::INFINITY).is_err());
    }
}
