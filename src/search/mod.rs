//! Template search over position, scale and rotation.
//!
//! [`Matcher`] drives the correlation scorer along a parameter axis: a coarse
//! scan over evenly spaced samples, valley detection under the configured
//! [`ScoreKind`], and golden-section refinement of the best valleys. Every
//! scorer evaluation is reported to an optional [`TrialObserver`].

pub(crate) mod axis;
pub mod golden;
pub mod observer;
mod rotation;
mod scale;

pub use golden::{golden_section, Probe};
pub use observer::{Axis, NoopObserver, Phase, Trial, TrialLog, TrialObserver};

use crate::image::{MaskedTemplate, PixelGrid};
use crate::score::{CorrelationScorer, Placement, ScoreKind};
use crate::trace::{trace_span, trace_trial};
use crate::util::{FftMatchError, FftMatchResult};

/// Best alignment found by a search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Match {
    /// Source row of the template's top-left pixel after scaling and
    /// rotation. For rotated templates this is the rotated corner, not the
    /// corner of the rotated bounding box.
    pub row: usize,
    /// Source column of the template's top-left pixel after scaling and
    /// rotation.
    pub col: usize,
    /// Score under the matcher's [`ScoreKind`]. For SSD searches over scale
    /// or rotation it is rescaled to the untransformed template's area.
    pub score: f64,
    /// Template scale factor (1 unless scale was searched).
    pub scale: f64,
    /// Template rotation in radians within `[0, 2π)` (0 unless rotation was
    /// searched).
    pub angle_rad: f64,
}

impl Match {
    /// Returns the position and score without the transform parameters.
    pub fn placement(&self) -> Placement {
        Placement {
            row: self.row,
            col: self.col,
            score: self.score,
        }
    }
}

/// Which parameters the matcher searches besides position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SearchMode {
    /// Position only, template used as given.
    #[default]
    Position,
    /// Position and scale.
    Scale,
    /// Position and rotation.
    Rotation,
    /// Position, scale and rotation; every scale trial runs a full rotation
    /// search.
    ScaleRotation,
}

/// Scale axis settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleSearch {
    /// Smallest scale factor considered.
    pub min_scale: f64,
    /// Largest scale factor considered.
    pub max_scale: f64,
    /// Number of geometrically spaced coarse samples.
    pub steps: usize,
}

impl Default for ScaleSearch {
    fn default() -> Self {
        Self {
            min_scale: 0.25,
            max_scale: 4.0,
            steps: 8,
        }
    }
}

/// Rotation axis settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotationSearch {
    /// Rotations scored over the full source to pick the crop region.
    pub prescan_steps: usize,
    /// Number of evenly spaced coarse angles over `[0, 2π)`.
    pub steps: usize,
    /// Extra pixels kept around the rotated template's diagonal when
    /// cropping.
    pub crop_margin: usize,
    /// Restrict coarse and refinement trials to a crop around the prescan
    /// hit. When false the prescan is skipped.
    pub crop_source: bool,
}

impl Default for RotationSearch {
    fn default() -> Self {
        Self {
            prescan_steps: 8,
            steps: 16,
            crop_margin: 8,
            crop_source: true,
        }
    }
}

/// Golden-section refinement settings shared by both axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefineConfig {
    /// Number of coarse valleys refined, best first.
    pub max_search: usize,
    /// Golden-section iterations per valley (one evaluation each, plus two
    /// initial probes).
    pub iterations: usize,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            max_search: 2,
            iterations: 10,
        }
    }
}

/// Matcher configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MatchConfig {
    /// Scoring policy used for every comparison.
    pub score: ScoreKind,
    /// Parameters searched besides position.
    pub mode: SearchMode,
    /// Score coarse samples and the two convolutions concurrently (requires
    /// the `rayon` feature; ignored otherwise).
    pub parallel: bool,
    /// Scale axis used by [`SearchMode::Scale`] and
    /// [`SearchMode::ScaleRotation`].
    pub scale: ScaleSearch,
    /// Rotation axis used by [`SearchMode::Rotation`] and
    /// [`SearchMode::ScaleRotation`].
    pub rotation: RotationSearch,
    /// Valley refinement applied on every searched axis.
    pub refine: RefineConfig,
}

impl MatchConfig {
    /// Validates configuration invariants.
    pub fn validate(&self) -> FftMatchResult<()> {
        let scale = &self.scale;
        if !scale.min_scale.is_finite() || !scale.max_scale.is_finite() {
            return Err(FftMatchError::InvalidConfig {
                reason: "scale bounds must be finite",
            });
        }
        if scale.min_scale <= 0.0 {
            return Err(FftMatchError::InvalidConfig {
                reason: "min_scale must be > 0",
            });
        }
        if scale.min_scale > scale.max_scale {
            return Err(FftMatchError::InvalidConfig {
                reason: "min_scale must not exceed max_scale",
            });
        }
        if scale.steps < 3 {
            return Err(FftMatchError::InvalidConfig {
                reason: "scale steps must be >= 3",
            });
        }
        if self.rotation.steps < 3 {
            return Err(FftMatchError::InvalidConfig {
                reason: "rotation steps must be >= 3",
            });
        }
        if self.rotation.crop_source && self.rotation.prescan_steps == 0 {
            return Err(FftMatchError::InvalidConfig {
                reason: "prescan_steps must be >= 1 when cropping",
            });
        }
        if self.refine.max_search == 0 {
            return Err(FftMatchError::InvalidConfig {
                reason: "max_search must be >= 1",
            });
        }
        if self.refine.iterations == 0 {
            return Err(FftMatchError::InvalidConfig {
                reason: "iterations must be >= 1",
            });
        }
        Ok(())
    }
}

/// Template matcher configured for one search mode.
#[derive(Clone, Debug)]
pub struct Matcher {
    cfg: MatchConfig,
    scorer: CorrelationScorer,
}

impl Matcher {
    /// Creates a matcher after validating `cfg`.
    pub fn new(cfg: MatchConfig) -> FftMatchResult<Self> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            scorer: CorrelationScorer::new(cfg.score).with_parallel(cfg.parallel),
        })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &MatchConfig {
        &self.cfg
    }

    /// Searches `source` for `template` according to the configured mode.
    ///
    /// Returns `Ok(None)` when the template cannot be placed for any searched
    /// parameter value.
    pub fn match_image(
        &self,
        source: &PixelGrid,
        template: &PixelGrid,
    ) -> FftMatchResult<Option<Match>> {
        self.match_image_observed(source, template, &mut NoopObserver)
    }

    /// Same as [`Matcher::match_image`], reporting every trial to `observer`.
    pub fn match_image_observed(
        &self,
        source: &PixelGrid,
        template: &PixelGrid,
        observer: &mut dyn TrialObserver,
    ) -> FftMatchResult<Option<Match>> {
        match self.cfg.mode {
            SearchMode::Position => self.match_position_observed(
                source,
                &MaskedTemplate::unmasked(template.clone()),
                observer,
            ),
            SearchMode::Scale => self.match_scale_observed(source, template, observer),
            SearchMode::Rotation => self.match_rotation_observed(source, template, observer),
            SearchMode::ScaleRotation => {
                self.match_scale_rotation_observed(source, template, observer)
            }
        }
    }

    /// Finds the best position of a masked template as given.
    pub fn match_position(
        &self,
        source: &PixelGrid,
        template: &MaskedTemplate,
    ) -> FftMatchResult<Option<Match>> {
        self.match_position_observed(source, template, &mut NoopObserver)
    }

    /// Same as [`Matcher::match_position`], reporting the single trial to
    /// `observer`.
    pub fn match_position_observed(
        &self,
        source: &PixelGrid,
        template: &MaskedTemplate,
        observer: &mut dyn TrialObserver,
    ) -> FftMatchResult<Option<Match>> {
        let _span = trace_span!("position_search").entered();
        let found = self.scorer.score(source, template)?.map(|p| Match {
            row: p.row,
            col: p.col,
            score: p.score,
            scale: 1.0,
            angle_rad: 0.0,
        });
        let probe = Probe::new(
            0.0,
            found.map_or(self.cfg.score.worst(), |m| m.score),
            found,
        );
        observer.on_trial(&trial(Axis::Position, Phase::Coarse, &probe));
        Ok(found)
    }

    /// Searches position and scale within the configured scale range.
    pub fn match_scale(
        &self,
        source: &PixelGrid,
        template: &PixelGrid,
    ) -> FftMatchResult<Option<Match>> {
        self.match_scale_observed(source, template, &mut NoopObserver)
    }

    /// Same as [`Matcher::match_scale`], reporting every trial to `observer`.
    pub fn match_scale_observed(
        &self,
        source: &PixelGrid,
        template: &PixelGrid,
        observer: &mut dyn TrialObserver,
    ) -> FftMatchResult<Option<Match>> {
        let reference_cells = template.area();
        self.scale_search(
            source.shape(),
            template.shape(),
            |scale, _inner| self.eval_scale(source, template, scale, reference_cells),
            observer,
        )
    }

    /// Searches position and rotation over the full turn.
    pub fn match_rotation(
        &self,
        source: &PixelGrid,
        template: &PixelGrid,
    ) -> FftMatchResult<Option<Match>> {
        self.match_rotation_observed(source, template, &mut NoopObserver)
    }

    /// Same as [`Matcher::match_rotation`], reporting prescan, coarse and
    /// refinement trials to `observer`.
    pub fn match_rotation_observed(
        &self,
        source: &PixelGrid,
        template: &PixelGrid,
        observer: &mut dyn TrialObserver,
    ) -> FftMatchResult<Option<Match>> {
        self.rotation_search(source, template, 1.0, template.area(), observer)
    }

    /// Searches position, scale and rotation.
    ///
    /// Each scale trial runs a complete rotation search on the scaled
    /// template; its rotation trials reach `observer` before the scale trial
    /// they belong to.
    pub fn match_scale_rotation(
        &self,
        source: &PixelGrid,
        template: &PixelGrid,
    ) -> FftMatchResult<Option<Match>> {
        self.match_scale_rotation_observed(source, template, &mut NoopObserver)
    }

    /// Same as [`Matcher::match_scale_rotation`], reporting every rotation
    /// and scale trial to `observer`.
    pub fn match_scale_rotation_observed(
        &self,
        source: &PixelGrid,
        template: &PixelGrid,
        observer: &mut dyn TrialObserver,
    ) -> FftMatchResult<Option<Match>> {
        let reference_cells = template.area();
        let kind = self.cfg.score;
        self.scale_search(
            source.shape(),
            template.shape(),
            |scale, inner| {
                let scaled = crate::template::scale_nearest(template, scale)?;
                let found =
                    self.rotation_search(source, scaled.grid(), scale, reference_cells, inner)?;
                Ok(Probe::new(
                    scale,
                    found.map_or(kind.worst(), |m| m.score),
                    found,
                ))
            },
            observer,
        )
    }
}

/// Builds the observer record for one evaluated parameter value.
pub(crate) fn trial(axis: Axis, phase: Phase, probe: &Probe<Option<Match>>) -> Trial {
    let trial = Trial {
        axis,
        phase,
        param: probe.param,
        placement: probe.value.map(|m| m.placement()),
        score: probe.score,
    };
    trace_trial!(&trial);
    trial
}
