//! Radix-2 FFT and packed integer convolution.
//!
//! Both operands are packed into one complex sequence (`a` real, `b`
//! imaginary). Squaring its spectrum gives `(a + ib)^2 = a^2 - b^2 + 2iab`
//! in the convolution domain, so after the inverse transform the imaginary
//! part holds `2 * conv(a, b)`. One forward/inverse pair replaces the three
//! transforms of the textbook approach.

use crate::util::{FftMatchError, FftMatchResult};
use num_complex::Complex64;
use std::f64::consts::TAU;

/// Precomputed bit-reversal table and twiddle factors for one transform length.
///
/// A plan is sized for operands of a fixed length `n`; the working length is
/// the next power of two `>= 2n`, so the cyclic result never wraps.
#[derive(Clone, Debug)]
pub struct FftPlan {
    operand_len: usize,
    len: usize,
    rev: Vec<usize>,
    twiddles: Vec<Complex64>,
}

impl FftPlan {
    /// Builds a plan for convolving two sequences of length `operand_len`.
    pub fn new(operand_len: usize) -> Self {
        let len = (2 * operand_len).next_power_of_two();
        let bits = len.trailing_zeros();

        let mut rev = vec![0usize; len];
        if bits > 0 {
            for i in 1..len {
                rev[i] = (rev[i >> 1] >> 1) | ((i & 1) << (bits - 1));
            }
        }

        let twiddles = (0..len / 2)
            .map(|j| {
                let theta = TAU * j as f64 / len as f64;
                Complex64::new(theta.cos(), theta.sin())
            })
            .collect();

        Self {
            operand_len,
            len,
            rev,
            twiddles,
        }
    }

    /// Returns the operand length this plan accepts.
    pub fn operand_len(&self) -> usize {
        self.operand_len
    }

    /// Returns the padded transform length (a power of two).
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the plan accepts only empty operands.
    pub fn is_empty(&self) -> bool {
        self.operand_len == 0
    }

    /// In-place forward or inverse transform of a buffer of length `len()`.
    ///
    /// The inverse includes the `1 / len` normalization.
    pub fn transform(&self, buf: &mut [Complex64], inverse: bool) {
        let n = self.len;
        debug_assert_eq!(buf.len(), n);

        for i in 0..n {
            let j = self.rev[i];
            if i < j {
                buf.swap(i, j);
            }
        }

        let mut half = 1usize;
        while half < n {
            let stride = n / (2 * half);
            for start in (0..n).step_by(2 * half) {
                for j in 0..half {
                    let mut w = self.twiddles[j * stride];
                    if inverse {
                        w = w.conj();
                    }
                    let u = buf[start + j];
                    let v = buf[start + j + half] * w;
                    buf[start + j] = u + v;
                    buf[start + j + half] = u - v;
                }
            }
            half <<= 1;
        }

        if inverse {
            let scale = n as f64;
            for value in buf.iter_mut() {
                *value /= scale;
            }
        }
    }

    /// Convolves `a` and `b`, returning `len()` integer outputs.
    ///
    /// Output `k` is `sum_i a[i] * b[k - i]` over the zero-padded operands.
    /// Values are rounded to the nearest integer; floating-point error is
    /// far below one unit for 8-bit image sizes.
    pub fn convolve(&self, a: &[i64], b: &[i64]) -> FftMatchResult<Vec<i64>> {
        if a.len() != b.len() {
            return Err(FftMatchError::LengthMismatch {
                left: a.len(),
                right: b.len(),
            });
        }
        if a.len() != self.operand_len {
            return Err(FftMatchError::LengthMismatch {
                left: a.len(),
                right: self.operand_len,
            });
        }
        if a.is_empty() {
            return Ok(vec![0; self.len]);
        }

        let mut buf = vec![Complex64::new(0.0, 0.0); self.len];
        for (slot, (&re, &im)) in buf.iter_mut().zip(a.iter().zip(b.iter())) {
            *slot = Complex64::new(re as f64, im as f64);
        }

        self.transform(&mut buf, false);
        for value in buf.iter_mut() {
            *value = *value * *value;
        }
        self.transform(&mut buf, true);

        Ok(buf.iter().map(|value| (value.im / 2.0).round() as i64).collect())
    }

    /// Runs two independent convolutions, concurrently when `parallel` is set
    /// and the `rayon` feature is enabled.
    pub fn convolve_pair(
        &self,
        first: (&[i64], &[i64]),
        second: (&[i64], &[i64]),
        parallel: bool,
    ) -> FftMatchResult<(Vec<i64>, Vec<i64>)> {
        #[cfg(feature = "rayon")]
        {
            if parallel {
                let (lhs, rhs) = rayon::join(
                    || self.convolve(first.0, first.1),
                    || self.convolve(second.0, second.1),
                );
                return Ok((lhs?, rhs?));
            }
        }
        #[cfg(not(feature = "rayon"))]
        let _ = parallel;

        Ok((
            self.convolve(first.0, first.1)?,
            self.convolve(second.0, second.1)?,
        ))
    }
}

/// Convolves two equal-length integer sequences with a one-off plan.
pub fn cyclic_convolve(a: &[i64], b: &[i64]) -> FftMatchResult<Vec<i64>> {
    if a.len() != b.len() {
        return Err(FftMatchError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    FftPlan::new(a.len()).convolve(a, b)
}
