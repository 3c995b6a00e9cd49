//! Owned pixel grids and validity masks.
//!
//! `PixelGrid` is a dense row-major `u8` image that carries its own
//! dimensions. Coordinates are `(row, col)` with the origin at the top-left
//! corner. Grids are immutable once built; transforms and crops produce new
//! grids.

use crate::util::{FftMatchError, FftMatchResult};

#[cfg(feature = "image-io")]
pub mod io;
mod mask;

pub use mask::{MaskedTemplate, ValidityMask};

/// Owned grayscale grid in contiguous row-major order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelGrid {
    data: Vec<u8>,
    height: usize,
    width: usize,
}

impl PixelGrid {
    /// Creates a grid from a row-major buffer of exactly `height * width` pixels.
    pub fn new(data: Vec<u8>, height: usize, width: usize) -> FftMatchResult<Self> {
        let expected = checked_area(height, width)?;
        if data.len() != expected {
            return Err(FftMatchError::BufferSizeMismatch {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            height,
            width,
        })
    }

    /// Creates a grid by evaluating `f(row, col)` for every cell.
    pub fn from_fn<F>(height: usize, width: usize, mut f: F) -> FftMatchResult<Self>
    where
        F: FnMut(usize, usize) -> u8,
    {
        let area = checked_area(height, width)?;
        let mut data = Vec::with_capacity(area);
        for row in 0..height {
            for col in 0..width {
                data.push(f(row, col));
            }
        }
        Ok(Self {
            data,
            height,
            width,
        })
    }

    /// Creates a grid with every pixel set to `value`.
    pub fn filled(height: usize, width: usize, value: u8) -> FftMatchResult<Self> {
        let area = checked_area(height, width)?;
        Ok(Self {
            data: vec![value; area],
            height,
            width,
        })
    }

    /// Returns the number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns `(height, width)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Returns the number of pixels.
    pub fn area(&self) -> usize {
        self.data.len()
    }

    /// Returns the row-major backing buffer.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the grid and returns its backing buffer.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Returns the pixel at `(row, col)` if it is within bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<u8> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.data.get(row * self.width + col).copied()
    }

    /// Returns row `row` as a slice of length `width`.
    pub fn row(&self, row: usize) -> Option<&[u8]> {
        if row >= self.height {
            return None;
        }
        let start = row * self.width;
        self.data.get(start..start + self.width)
    }

    /// Copies the `height x width` region whose top-left corner is `(row, col)`.
    pub fn crop(
        &self,
        row: usize,
        col: usize,
        height: usize,
        width: usize,
    ) -> FftMatchResult<Self> {
        let out_of_bounds = FftMatchError::RegionOutOfBounds {
            row,
            col,
            height,
            width,
            grid_height: self.height,
            grid_width: self.width,
        };
        if height == 0 || width == 0 {
            return Err(FftMatchError::InvalidDimensions { height, width });
        }
        let end_row = row.checked_add(height).ok_or(out_of_bounds.clone())?;
        let end_col = col.checked_add(width).ok_or(out_of_bounds.clone())?;
        if end_row > self.height || end_col > self.width {
            return Err(out_of_bounds);
        }

        let mut data = Vec::with_capacity(height * width);
        for r in row..end_row {
            let start = r * self.width;
            data.extend_from_slice(&self.data[start + col..start + end_col]);
        }
        Ok(Self {
            data,
            height,
            width,
        })
    }
}

pub(crate) fn checked_area(height: usize, width: usize) -> FftMatchResult<usize> {
    if height == 0 || width == 0 {
        return Err(FftMatchError::InvalidDimensions { height, width });
    }
    height
        .checked_mul(width)
        .ok_or(FftMatchError::InvalidDimensions { height, width })
}
