//! Shared 1-D axis machinery: coarse sampling, valley detection and
//! refinement of the best valleys.

use crate::score::ScoreKind;
use crate::search::golden::{golden_section, Probe};
use crate::search::RefineConfig;
use crate::util::FftMatchResult;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Evaluates `eval` at every parameter, in parallel when requested.
///
/// Results are returned in parameter order either way.
pub(crate) fn sample_axis<R, F>(params: &[f64], parallel: bool, eval: F) -> FftMatchResult<Vec<R>>
where
    R: Send,
    F: Fn(f64) -> FftMatchResult<R> + Sync,
{
    #[cfg(feature = "rayon")]
    {
        if parallel {
            return params.par_iter().map(|&param| eval(param)).collect();
        }
    }
    #[cfg(not(feature = "rayon"))]
    let _ = parallel;

    params.iter().map(|&param| eval(param)).collect()
}

/// Returns indices whose score is strictly better than every neighbour,
/// best first.
///
/// On a circular axis the first and last samples are neighbours. On a
/// clamped axis the endpoints are candidates too, compared with their single
/// neighbour, so an optimum at either end of the range is still refined; its
/// bracket then spans only the one neighbouring interval. Equal scores keep
/// index order.
pub(crate) fn find_valleys(scores: &[f64], circular: bool, kind: ScoreKind) -> Vec<usize> {
    let len = scores.len();
    let mut valleys = Vec::new();
    if len < 2 {
        return valleys;
    }

    for idx in 0..len {
        let prev = if idx > 0 {
            Some(idx - 1)
        } else if circular {
            Some(len - 1)
        } else {
            None
        };
        let next = if idx + 1 < len {
            Some(idx + 1)
        } else if circular {
            Some(0)
        } else {
            None
        };

        let current = scores[idx];
        let beats = |other: Option<usize>| match other {
            Some(other) if other != idx => kind.is_better(current, scores[other]),
            _ => true,
        };
        if beats(prev) && beats(next) {
            valleys.push(idx);
        }
    }

    valleys.sort_by(|&a, &b| {
        if kind.is_better(scores[a], scores[b]) {
            std::cmp::Ordering::Less
        } else if kind.is_better(scores[b], scores[a]) {
            std::cmp::Ordering::Greater
        } else {
            a.cmp(&b)
        }
    });
    valleys
}

/// Refines the best `max_search` valleys of a coarse scan and returns the
/// overall best probe.
///
/// `bracket(idx)` gives the refinement interval around coarse sample `idx`.
/// Each valley's own coarse sample seeds its result, so refinement never
/// reports anything worse than the scan. Without valleys (e.g. a flat scan)
/// the best coarse sample is returned.
pub(crate) fn refine_valleys<T, B, F>(
    coarse: &[Probe<T>],
    circular: bool,
    kind: ScoreKind,
    refine: &RefineConfig,
    bracket: B,
    mut eval: F,
) -> FftMatchResult<Option<Probe<T>>>
where
    T: Clone,
    B: Fn(usize) -> (f64, f64),
    F: FnMut(f64) -> FftMatchResult<Probe<T>>,
{
    let scores: Vec<f64> = coarse.iter().map(|probe| probe.score).collect();
    let valleys = find_valleys(&scores, circular, kind);

    let mut best: Option<Probe<T>> = None;
    for &idx in valleys.iter().take(refine.max_search) {
        let (left, right) = bracket(idx);
        let refined = golden_section(left, right, refine.iterations, kind, &mut eval)?;
        let seed = &coarse[idx];
        let local = if kind.is_better(refined.score, seed.score) {
            refined
        } else {
            seed.clone()
        };
        if best
            .as_ref()
            .map_or(true, |b| kind.is_better(local.score, b.score))
        {
            best = Some(local);
        }
    }

    if best.is_none() {
        for probe in coarse {
            if best
                .as_ref()
                .map_or(true, |b| kind.is_better(probe.score, b.score))
            {
                best = Some(probe.clone());
            }
        }
    }

    // A best that never beat the sentinel means nothing fit anywhere.
    Ok(best.filter(|probe| kind.is_better(probe.score, kind.worst())))
}
