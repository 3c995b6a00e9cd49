//! Conditional tracing macros (zero-cost when feature disabled).
//!
//! With the `tracing` feature these forward to `tracing` spans and events;
//! without it they compile to nothing.

/// Create an info-level span for a search phase or scorer evaluation.
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($name $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        $crate::trace::NoopSpan
    };
}

/// Emit a debug-level event for a single measurement (one trial, one crop).
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::debug!(name: $name, $($key = $value),+)
    };
    ($name:expr) => {
        tracing::debug!(name: $name)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
    ($name:expr) => {};
}

/// Emit a trace-level event describing one scored [`Trial`](crate::search::Trial).
#[cfg(feature = "tracing")]
macro_rules! trace_trial {
    ($trial:expr) => {{
        let trial: &$crate::search::Trial = $trial;
        tracing::trace!(
            name: "trial",
            axis = ?trial.axis,
            phase = ?trial.phase,
            param = trial.param,
            score = trial.score,
            fits = trial.placement.is_some()
        )
    }};
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_trial {
    ($trial:expr) => {
        let _: &$crate::search::Trial = $trial;
    };
}

pub(crate) use trace_event;
pub(crate) use trace_span;
pub(crate) use trace_trial;

/// Stand-in for `tracing::Span` when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    /// Returns self, mimicking `Span::entered()`.
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}
