//! Golden-section refinement over a 1-D bracket.

use crate::score::ScoreKind;
use crate::util::math::INV_PHI;
use crate::util::FftMatchResult;

/// Evaluated point on a parameter axis.
#[derive(Clone, Debug, PartialEq)]
pub struct Probe<T> {
    /// Parameter value (scale factor or angle).
    pub param: f64,
    /// Score used for comparisons under the active [`ScoreKind`].
    pub score: f64,
    /// Payload carried with the score, e.g. the placement.
    pub value: T,
}

impl<T> Probe<T> {
    /// Pairs an evaluated parameter with its score and payload.
    pub fn new(param: f64, score: f64, value: T) -> Self {
        Self {
            param,
            score,
            value,
        }
    }
}

/// Narrows `[left, right]` towards the best score of `eval`.
///
/// Two interior probes sit at fractions `1 - φ` and `φ` of the bracket
/// (`φ = (√5 - 1) / 2`). Each of the `iterations` steps keeps the
/// sub-interval around the better probe, reuses the surviving probe and
/// evaluates exactly one new point, so `eval` runs `iterations + 2` times.
/// Ties discard the left sub-interval. Returns the best probe seen.
pub fn golden_section<T, F>(
    left: f64,
    right: f64,
    iterations: usize,
    kind: ScoreKind,
    mut eval: F,
) -> FftMatchResult<Probe<T>>
where
    T: Clone,
    F: FnMut(f64) -> FftMatchResult<Probe<T>>,
{
    let mut lo = left;
    let mut hi = right;
    let mut x1 = hi - INV_PHI * (hi - lo);
    let mut x2 = lo + INV_PHI * (hi - lo);
    let mut p1 = eval(x1)?;
    let mut p2 = eval(x2)?;
    let mut best = if kind.is_better(p2.score, p1.score) {
        p2.clone()
    } else {
        p1.clone()
    };

    for _ in 0..iterations {
        let fresh = if kind.is_better(p1.score, p2.score) {
            hi = x2;
            x2 = x1;
            x1 = hi - INV_PHI * (hi - lo);
            let fresh = eval(x1)?;
            p2 = std::mem::replace(&mut p1, fresh);
            &p1
        } else {
            lo = x1;
            x1 = x2;
            x2 = lo + INV_PHI * (hi - lo);
            let fresh = eval(x2)?;
            p1 = std::mem::replace(&mut p2, fresh);
            &p2
        };
        if kind.is_better(fresh.score, best.score) {
            best = fresh.clone();
        }
    }

    Ok(best)
}
