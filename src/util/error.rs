//! Error types for fftmatch.

use thiserror::Error;

/// Result alias for fftmatch operations.
pub type FftMatchResult<T> = std::result::Result<T, FftMatchError>;

/// Errors that can occur when running fftmatch algorithms.
///
/// A template that does not fit inside the source is not an error; scoring
/// reports it as `Ok(None)`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FftMatchError {
    /// Grid dimensions must both be non-zero.
    #[error("invalid dimensions: {height}x{width}")]
    InvalidDimensions { height: usize, width: usize },
    /// Backing buffer length does not equal `height * width`.
    #[error("buffer size mismatch: expected {expected}, got {got}")]
    BufferSizeMismatch { expected: usize, got: usize },
    /// A validity mask does not have the shape of its template.
    #[error("mask shape {mask:?} does not match template shape {template:?}")]
    MaskShapeMismatch {
        template: (usize, usize),
        mask: (usize, usize),
    },
    /// Convolution operands must have equal length.
    #[error("convolution operands differ in length: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
    /// A scale or rotation parameter would produce an unusable template.
    #[error("degenerate transform: {reason}")]
    DegenerateTransform { reason: &'static str },
    /// A requested region does not lie inside the grid.
    #[error(
        "region ({row}, {col}) {height}x{width} out of bounds for {grid_height}x{grid_width} grid"
    )]
    RegionOutOfBounds {
        row: usize,
        col: usize,
        height: usize,
        width: usize,
        grid_height: usize,
        grid_width: usize,
    },
    /// The search configuration is invalid.
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: &'static str },
    /// Image decoding or IO failure.
    #[error("image io error: {reason}")]
    ImageIo { reason: String },
}
