//! FFT correlation scorer.

use crate::image::{MaskedTemplate, PixelGrid};
use crate::kernel::FftPlan;
use crate::score::{Placement, ScoreKind};
use crate::trace::trace_span;
use crate::util::FftMatchResult;

/// Dense score surface over all valid placements.
#[derive(Clone, Debug)]
pub struct ScoreMap {
    rows: usize,
    cols: usize,
    scores: Vec<f64>,
}

impl ScoreMap {
    /// Number of placement rows (`source.height - template.height + 1`).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of placement columns (`source.width - template.width + 1`).
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns the score with the template's top-left corner at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.scores.get(row * self.cols + col).copied()
    }

    /// Returns the row-major scores.
    pub fn as_slice(&self) -> &[f64] {
        &self.scores
    }

    /// Returns the best placement; the earliest row-major placement wins ties.
    pub fn best(&self, kind: ScoreKind) -> Placement {
        let mut best = Placement {
            row: 0,
            col: 0,
            score: self.scores[0],
        };
        for row in 0..self.rows {
            let base = row * self.cols;
            for col in 0..self.cols {
                let score = self.scores[base + col];
                if kind.is_better(score, best.score) {
                    best = Placement { row, col, score };
                }
            }
        }
        best
    }
}

/// Scores templates against a source with a fixed policy.
#[derive(Clone, Copy, Debug, Default)]
pub struct CorrelationScorer {
    kind: ScoreKind,
    parallel: bool,
}

impl CorrelationScorer {
    /// Creates a sequential scorer.
    pub fn new(kind: ScoreKind) -> Self {
        Self {
            kind,
            parallel: false,
        }
    }

    /// Runs the two convolutions concurrently (requires the `rayon` feature).
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Returns the scoring policy.
    pub fn kind(&self) -> ScoreKind {
        self.kind
    }

    /// Returns the best placement, or `None` if the template does not fit.
    pub fn score(
        &self,
        source: &PixelGrid,
        template: &MaskedTemplate,
    ) -> FftMatchResult<Option<Placement>> {
        Ok(self
            .score_map(source, template)?
            .map(|map| map.best(self.kind)))
    }

    /// Computes the score of every placement, or `None` if the template does
    /// not fit.
    pub fn score_map(
        &self,
        source: &PixelGrid,
        template: &MaskedTemplate,
    ) -> FftMatchResult<Option<ScoreMap>> {
        let (src_h, src_w) = source.shape();
        let (tpl_h, tpl_w) = (template.height(), template.width());
        if tpl_h > src_h || tpl_w > src_w {
            return Ok(None);
        }

        let _span = trace_span!(
            "score",
            src_h = src_h,
            src_w = src_w,
            tpl_h = tpl_h,
            tpl_w = tpl_w
        )
        .entered();

        let len = source.area();
        let pixels = source.as_slice();
        let src: Vec<i64> = pixels.iter().map(|&v| i64::from(v)).collect();
        let src_sq: Vec<i64> = pixels.iter().map(|&v| i64::from(v) * i64::from(v)).collect();

        // Template and mask laid out with the source stride, then reversed so
        // convolution yields the sliding dot product.
        let mut tpl = vec![0i64; len];
        let mut mask = vec![0i64; len];
        let mut tpl_sum_sq = 0i64;
        let tpl_pixels = template.grid().as_slice();
        let valid = template.mask().as_slice();
        for r in 0..tpl_h {
            for c in 0..tpl_w {
                let t_idx = r * tpl_w + c;
                if !valid[t_idx] {
                    continue;
                }
                let value = i64::from(tpl_pixels[t_idx]);
                tpl[r * src_w + c] = value;
                mask[r * src_w + c] = 1;
                tpl_sum_sq += value * value;
            }
        }
        tpl.reverse();
        mask.reverse();

        let plan = FftPlan::new(len);
        let (cross, src_sq_masked) =
            plan.convolve_pair((&src, &tpl), (&src_sq, &mask), self.parallel)?;

        let rows = src_h - tpl_h + 1;
        let cols = src_w - tpl_w + 1;
        let mut scores = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                let idx = row * src_w + col + len - 1;
                let st = cross[idx];
                let s2 = src_sq_masked[idx];
                let score = match self.kind {
                    ScoreKind::SumSquaredDifference => (s2 - 2 * st + tpl_sum_sq).max(0) as f64,
                    ScoreKind::NormalizedCorrelation => {
                        let denom = (s2 as f64 * tpl_sum_sq as f64).sqrt();
                        if denom > 0.0 {
                            st as f64 / denom
                        } else {
                            0.0
                        }
                    }
                };
                scores.push(score);
            }
        }

        Ok(Some(ScoreMap { rows, cols, scores }))
    }
}

/// Scores `template` against `source` sequentially under `kind`.
pub fn score(
    source: &PixelGrid,
    template: &MaskedTemplate,
    kind: ScoreKind,
) -> FftMatchResult<Option<Placement>> {
    CorrelationScorer::new(kind).score(source, template)
}
