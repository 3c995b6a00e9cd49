//! Rotation search: prescan, source cropping, coarse scan and refinement.

use std::f64::consts::TAU;

use crate::image::PixelGrid;
use crate::search::axis::{refine_valleys, sample_axis};
use crate::search::{trial, Axis, Match, Matcher, Phase, Probe, TrialObserver};
use crate::template::{rotate_bilinear, rotated_origin};
use crate::trace::{trace_event, trace_span};
use crate::util::math::{circular_samples, wrap_rad};
use crate::util::FftMatchResult;

/// Top-left corner of the searched region inside the full source.
type Origin = (usize, usize);

impl Matcher {
    /// Finds the best rotation of `template` (already scaled by `scale`).
    ///
    /// SSD scores are normalized to `reference_cells` so trials with different
    /// rotated footprints compare fairly.
    pub(crate) fn rotation_search(
        &self,
        source: &PixelGrid,
        template: &PixelGrid,
        scale: f64,
        reference_cells: usize,
        observer: &mut dyn TrialObserver,
    ) -> FftMatchResult<Option<Match>> {
        let cfg = &self.cfg.rotation;
        let kind = self.cfg.score;
        let _span = trace_span!(
            "rotation_search",
            scale = scale,
            steps = cfg.steps,
            prescan_steps = cfg.prescan_steps
        )
        .entered();

        let cropped;
        let crop = self.prescan_crop(source, template, scale, reference_cells, observer)?;
        let (region, origin) = match crop {
            Some((grid, origin)) => {
                cropped = grid;
                (&cropped, origin)
            }
            None => (source, (0, 0)),
        };

        let angles = circular_samples(cfg.steps);
        let coarse = sample_axis(&angles, self.cfg.parallel, |angle| {
            self.eval_rotation(region, origin, template, angle, scale, reference_cells)
        })?;
        for probe in &coarse {
            observer.on_trial(&trial(Axis::Rotation, Phase::Coarse, probe));
        }

        let step = TAU / cfg.steps as f64;
        let best = refine_valleys(
            &coarse,
            true,
            kind,
            &self.cfg.refine,
            |idx| (angles[idx] - step, angles[idx] + step),
            |angle| {
                let probe =
                    self.eval_rotation(region, origin, template, angle, scale, reference_cells)?;
                observer.on_trial(&trial(Axis::Rotation, Phase::Refine, &probe));
                Ok(probe)
            },
        )?;

        Ok(best.and_then(|probe| probe.value))
    }

    /// Scores coarse rotations over the full source and crops a square box
    /// around the best hit. Returns `None` when cropping is disabled or no
    /// rotation fits.
    fn prescan_crop(
        &self,
        source: &PixelGrid,
        template: &PixelGrid,
        scale: f64,
        reference_cells: usize,
        observer: &mut dyn TrialObserver,
    ) -> FftMatchResult<Option<(PixelGrid, Origin)>> {
        let cfg = &self.cfg.rotation;
        if !cfg.crop_source {
            return Ok(None);
        }
        let kind = self.cfg.score;

        let angles = circular_samples(cfg.prescan_steps);
        let prescan = sample_axis(&angles, self.cfg.parallel, |angle| {
            self.eval_rotation(source, (0, 0), template, angle, scale, reference_cells)
        })?;
        let mut best: Option<&Probe<Option<Match>>> = None;
        for probe in &prescan {
            observer.on_trial(&trial(Axis::Rotation, Phase::Prescan, probe));
            let improves = best.map_or(true, |b| kind.is_better(probe.score, b.score));
            if probe.value.is_some() && improves {
                best = Some(probe);
            }
        }
        let Some(hit) = best.and_then(|probe| probe.value) else {
            return Ok(None);
        };

        // Centre of the rotated template's bounding box at the prescan hit.
        let rotated = rotate_bilinear(template, hit.angle_rad)?;
        let (rot_h, rot_w) = rotated.grid().shape();
        let (off_r, off_c) = rotated_origin(rotated.mask(), hit.angle_rad);
        let centre_r = (hit.row - off_r) as f64 + rot_h as f64 * 0.5;
        let centre_c = (hit.col - off_c) as f64 + rot_w as f64 * 0.5;

        let (tpl_h, tpl_w) = template.shape();
        let diagonal = ((tpl_h * tpl_h + tpl_w * tpl_w) as f64).sqrt();
        let side = diagonal.ceil() as usize + 2 * cfg.crop_margin;
        let (src_h, src_w) = source.shape();
        let (row0, row1) = clip_span(centre_r, side, src_h);
        let (col0, col1) = clip_span(centre_c, side, src_w);
        trace_event!(
            "rotation_crop",
            row = row0,
            col = col0,
            height = row1 - row0,
            width = col1 - col0
        );

        let crop = source.crop(row0, col0, row1 - row0, col1 - col0)?;
        Ok(Some((crop, (row0, col0))))
    }

    /// Scores one rotation inside `region` and reports where the template's
    /// own top-left pixel lands in the full source.
    fn eval_rotation(
        &self,
        region: &PixelGrid,
        origin: Origin,
        template: &PixelGrid,
        angle: f64,
        scale: f64,
        reference_cells: usize,
    ) -> FftMatchResult<Probe<Option<Match>>> {
        let kind = self.cfg.score;
        let angle = wrap_rad(angle);
        let rotated = rotate_bilinear(template, angle)?;
        let (off_r, off_c) = rotated_origin(rotated.mask(), angle);
        let found = self.scorer.score(region, &rotated)?.map(|p| Match {
            row: p.row + origin.0 + off_r,
            col: p.col + origin.1 + off_c,
            score: kind.normalize(p.score, reference_cells, rotated.valid_count()),
            scale,
            angle_rad: angle,
        });
        let score = found.map_or(kind.worst(), |m| m.score);
        Ok(Probe::new(angle, score, found))
    }
}

/// Returns `[start, end)` of a window of `len` cells centred on `centre`,
/// clipped to `[0, limit)`.
fn clip_span(centre: f64, len: usize, limit: usize) -> (usize, usize) {
    let start = (centre - len as f64 * 0.5).floor();
    let end = start + len as f64;
    let start = start.max(0.0) as usize;
    let end = (end.max(0.0) as usize).min(limit);
    (start.min(end), end)
}
