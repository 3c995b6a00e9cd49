//! Correlation scoring of a template against every placement in a source.
//!
//! Scores come from two FFT convolutions (source with the reversed template,
//! squared source with the reversed mask) combined through
//! `SSD = sum(s^2) - 2 sum(s t) + sum(t^2)` over masked cells.

mod correlate;

pub use correlate::{score, CorrelationScorer, ScoreMap};

/// Scoring policy and its comparison direction.
///
/// The same kind must be used for coarse scans, valley detection and
/// refinement; every comparison in the crate goes through [`ScoreKind::is_better`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScoreKind {
    /// Masked sum of squared differences; lower is better, 0 is exact.
    #[default]
    SumSquaredDifference,
    /// `sum(s t) / sqrt(sum(s^2) sum(t^2))` over masked cells; higher is better.
    NormalizedCorrelation,
}

impl ScoreKind {
    /// Returns true if `candidate` is strictly better than `incumbent`.
    pub fn is_better(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            ScoreKind::SumSquaredDifference => candidate < incumbent,
            ScoreKind::NormalizedCorrelation => candidate > incumbent,
        }
    }

    /// Returns the score assigned to trials that produced no placement.
    pub fn worst(self) -> f64 {
        match self {
            ScoreKind::SumSquaredDifference => f64::INFINITY,
            ScoreKind::NormalizedCorrelation => f64::NEG_INFINITY,
        }
    }

    /// Returns true if `score` is at least as good as `threshold`.
    pub fn passes(self, score: f64, threshold: f64) -> bool {
        match self {
            ScoreKind::SumSquaredDifference => score <= threshold,
            ScoreKind::NormalizedCorrelation => score >= threshold,
        }
    }

    /// Rescales a trial score so templates with different footprints compare
    /// fairly. SSD grows with the number of scored cells; correlation does not.
    pub(crate) fn normalize(self, score: f64, reference_cells: usize, trial_cells: usize) -> f64 {
        match self {
            ScoreKind::SumSquaredDifference if trial_cells > 0 => {
                score * reference_cells as f64 / trial_cells as f64
            }
            _ => score,
        }
    }
}

/// Best placement of a template inside a source.
///
/// `row`/`col` locate the template's top-left corner in the source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Row of the top-left corner.
    pub row: usize,
    /// Column of the top-left corner.
    pub col: usize,
    /// Score under the scorer's [`ScoreKind`].
    pub score: f64,
}
