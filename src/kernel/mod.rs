//! Convolution kernel.
//!
//! The kernel computes integer convolutions in `O(n log n)` via a radix-2
//! FFT. The correlation scorer is its only consumer inside the crate; the
//! plan type is public so callers can convolve their own sequences.

pub mod fft;

pub use fft::{cyclic_convolve, FftPlan};
