//! Validity masks and masked templates.

use crate::image::{checked_area, PixelGrid};
use crate::util::{FftMatchError, FftMatchResult};

/// Per-cell flags marking which template pixels take part in scoring.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidityMask {
    cells: Vec<bool>,
    height: usize,
    width: usize,
}

impl ValidityMask {
    /// Creates a mask from a row-major buffer of exactly `height * width` flags.
    pub fn new(cells: Vec<bool>, height: usize, width: usize) -> FftMatchResult<Self> {
        let expected = checked_area(height, width)?;
        if cells.len() != expected {
            return Err(FftMatchError::BufferSizeMismatch {
                expected,
                got: cells.len(),
            });
        }
        Ok(Self {
            cells,
            height,
            width,
        })
    }

    /// Creates a mask in which every cell is valid.
    pub fn all_valid(height: usize, width: usize) -> FftMatchResult<Self> {
        let area = checked_area(height, width)?;
        Ok(Self {
            cells: vec![true; area],
            height,
            width,
        })
    }

    /// Creates a mask by evaluating `f(row, col)` for every cell.
    pub fn from_fn<F>(height: usize, width: usize, mut f: F) -> FftMatchResult<Self>
    where
        F: FnMut(usize, usize) -> bool,
    {
        let area = checked_area(height, width)?;
        let mut cells = Vec::with_capacity(area);
        for row in 0..height {
            for col in 0..width {
                cells.push(f(row, col));
            }
        }
        Ok(Self {
            cells,
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

    /// Returns the row-major flags.
    pub fn as_slice(&self) -> &[bool] {
        &self.cells
    }

    /// Returns whether `(row, col)` is valid; out-of-bounds cells are not.
    pub fn is_valid(&self, row: usize, col: usize) -> bool {
        row < self.height && col < self.width && self.cells[row * self.width + col]
    }

    /// Returns the number of valid cells.
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&valid| valid).count()
    }
}

/// Template grid paired with a mask of the same shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaskedTemplate {
    grid: PixelGrid,
    mask: ValidityMask,
}

impl MaskedTemplate {
    /// Pairs a grid with its mask, rejecting mismatched shapes.
    pub fn new(grid: PixelGrid, mask: ValidityMask) -> FftMatchResult<Self> {
        if grid.shape() != mask.shape() {
            return Err(FftMatchError::MaskShapeMismatch {
                template: grid.shape(),
                mask: mask.shape(),
            });
        }
        Ok(Self { grid, mask })
    }

    /// Wraps a grid with an all-valid mask.
    pub fn unmasked(grid: PixelGrid) -> Self {
        let (height, width) = grid.shape();
        let mask = ValidityMask {
            cells: vec![true; grid.area()],
            height,
            width,
        };
        Self { grid, mask }
    }

    /// Returns the template pixels.
    pub fn grid(&self) -> &PixelGrid {
        &self.grid
    }

    /// Returns the validity mask.
    pub fn mask(&self) -> &ValidityMask {
        &self.mask
    }

    /// Returns the number of rows.
    pub fn height(&self) -> usize {
        self.grid.height()
    }

    /// Returns the number of columns.
    pub fn width(&self) -> usize {
        self.grid.width()
    }

    /// Returns the number of cells that participate in scoring.
    pub fn valid_count(&self) -> usize {
        self.mask.count()
    }
}
