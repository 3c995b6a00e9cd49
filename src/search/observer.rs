//! Per-trial diagnostics.
//!
//! The coordinator reports every scorer evaluation to a [`TrialObserver`]
//! supplied by the caller. Nothing is retained between calls.

use crate::score::Placement;

/// Parameter axis a trial belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// Position-only matching (no parameter).
    Position,
    /// Template scale factor.
    Scale,
    /// Template rotation in radians.
    Rotation,
}

/// Search phase that produced a trial.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Full-source rotation scan used to choose the crop region.
    Prescan,
    /// Evenly spaced samples along the axis.
    Coarse,
    /// Golden-section probe inside a valley bracket.
    Refine,
}

/// One evaluated parameter value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Trial {
    /// Axis the evaluated parameter lies on.
    pub axis: Axis,
    /// Search phase that requested the evaluation.
    pub phase: Phase,
    /// Scale factor or angle in radians (0 for position-only).
    pub param: f64,
    /// Best placement in source coordinates, if the template fit.
    pub placement: Option<Placement>,
    /// Score used for comparisons (normalized for SSD across footprints).
    pub score: f64,
}

/// Receives trials as the search runs.
pub trait TrialObserver {
    /// Called once per scorer evaluation, in search order.
    fn on_trial(&mut self, trial: &Trial);
}

impl<F> TrialObserver for F
where
    F: FnMut(&Trial),
{
    fn on_trial(&mut self, trial: &Trial) {
        self(trial)
    }
}

/// Observer that discards every trial.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl TrialObserver for NoopObserver {
    fn on_trial(&mut self, _trial: &Trial) {}
}

/// Observer that records trials in order.
#[derive(Clone, Debug, Default)]
pub struct TrialLog {
    trials: Vec<Trial>,
}

impl TrialLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded trials.
    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    /// Returns how many trials match `axis` and `phase`.
    pub fn count(&self, axis: Axis, phase: Phase) -> usize {
        self.trials
            .iter()
            .filter(|trial| trial.axis == axis && trial.phase == phase)
            .count()
    }

    /// Forwards the recorded trials to another observer.
    pub fn replay(&self, observer: &mut dyn TrialObserver) {
        for trial in &self.trials {
            observer.on_trial(trial);
        }
    }
}

impl TrialObserver for TrialLog {
    fn on_trial(&mut self, trial: &Trial) {
        self.trials.push(*trial);
    }
}
