//! Scale search over a geometric range of factors.

use crate::image::PixelGrid;
use crate::search::axis::{refine_valleys, sample_axis};
use crate::search::{
    trial, Axis, Match, Matcher, Phase, Probe, ScaleSearch, TrialLog, TrialObserver,
};
use crate::template::scale_nearest;
use crate::trace::{trace_event, trace_span};
use crate::util::math::geometric_samples;
use crate::util::FftMatchResult;

/// Narrows `[min_scale, max_scale]` to factors whose scaled template has at
/// least one row and column and still fits inside the source.
///
/// Returns `None` when no such factor exists.
pub(crate) fn effective_range(
    cfg: &ScaleSearch,
    source: (usize, usize),
    template: (usize, usize),
) -> Option<(f64, f64)> {
    let (src_h, src_w) = source;
    let (tpl_h, tpl_w) = template;
    let lower = cfg.min_scale.max(1.0 / tpl_h.min(tpl_w) as f64);
    let upper = cfg
        .max_scale
        .min(src_h as f64 / tpl_h as f64)
        .min(src_w as f64 / tpl_w as f64);
    (lower <= upper).then_some((lower, upper))
}

impl Matcher {
    /// Runs coarse sampling and refinement along the scale axis.
    ///
    /// `eval(scale, inner)` scores one scale factor; nested searches record
    /// their own trials in `inner`, which is replayed to `observer` ahead of
    /// the scale trial.
    pub(crate) fn scale_search<F>(
        &self,
        source: (usize, usize),
        template: (usize, usize),
        eval: F,
        observer: &mut dyn TrialObserver,
    ) -> FftMatchResult<Option<Match>>
    where
        F: Fn(f64, &mut TrialLog) -> FftMatchResult<Probe<Option<Match>>> + Sync,
    {
        let cfg = &self.cfg.scale;
        let _span = trace_span!("scale_search", steps = cfg.steps).entered();

        let Some((lower, upper)) = effective_range(cfg, source, template) else {
            trace_event!(
                "scale_range_empty",
                min_scale = cfg.min_scale,
                max_scale = cfg.max_scale
            );
            return Ok(None);
        };
        trace_event!("scale_range", lower = lower, upper = upper);

        let scales = geometric_samples(lower, upper, cfg.steps);
        let sampled = sample_axis(&scales, self.cfg.parallel, |scale| {
            let mut inner = TrialLog::new();
            let probe = eval(scale, &mut inner)?;
            Ok((probe, inner))
        })?;
        let mut coarse = Vec::with_capacity(sampled.len());
        for (probe, inner) in sampled {
            inner.replay(observer);
            observer.on_trial(&trial(Axis::Scale, Phase::Coarse, &probe));
            coarse.push(probe);
        }

        let last = scales.len() - 1;
        let best = refine_valleys(
            &coarse,
            false,
            self.cfg.score,
            &self.cfg.refine,
            |idx| (scales[idx.saturating_sub(1)], scales[(idx + 1).min(last)]),
            |scale| {
                let mut inner = TrialLog::new();
                let probe = eval(scale, &mut inner)?;
                inner.replay(observer);
                observer.on_trial(&trial(Axis::Scale, Phase::Refine, &probe));
                Ok(probe)
            },
        )?;

        Ok(best.and_then(|probe| probe.value))
    }

    /// Scores one scale factor of `template` against the full source.
    pub(crate) fn eval_scale(
        &self,
        source: &PixelGrid,
        template: &PixelGrid,
        scale: f64,
        reference_cells: usize,
    ) -> FftMatchResult<Probe<Option<Match>>> {
        let kind = self.cfg.score;
        let scaled = scale_nearest(template, scale)?;
        let found = self.scorer.score(source, &scaled)?.map(|p| Match {
            row: p.row,
            col: p.col,
            score: kind.normalize(p.score, reference_cells, scaled.valid_count()),
            scale,
            angle_rad: 0.0,
        });
        let score = found.map_or(kind.worst(), |m| m.score);
        Ok(Probe::new(scale, score, found))
    }
}
