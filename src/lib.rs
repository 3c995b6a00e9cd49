//! fftmatch locates a template inside a larger grayscale image.
//!
//! Every placement is scored in one pass with two FFT convolutions, under
//! either masked sum of squared differences or normalized correlation. On top
//! of position-only matching the [`Matcher`] searches unknown scale and
//! rotation with a coarse scan, valley detection and golden-section
//! refinement. Optional features add parallel scoring (`rayon`), image
//! loading (`image-io`) and spans/events (`tracing`).
//!
//! ```
//! use fftmatch::{MatchConfig, Matcher, PixelGrid};
//!
//! let source = PixelGrid::from_fn(16, 16, |r, c| ((r * 31 + c * 7) % 251) as u8)?;
//! let template = source.crop(5, 9, 4, 4)?;
//! let matcher = Matcher::new(MatchConfig::default())?;
//! let found = matcher.match_image(&source, &template)?.expect("template fits");
//! assert_eq!((found.row, found.col), (5, 9));
//! # Ok::<(), fftmatch::FftMatchError>(())
//! ```

pub mod image;
pub mod kernel;
pub mod score;
pub mod search;
pub mod template;
mod trace;
pub mod util;

#[cfg(feature = "image-io")]
pub use image::io;
pub use image::{MaskedTemplate, PixelGrid, ValidityMask};
pub use kernel::{cyclic_convolve, FftPlan};
pub use score::{score, CorrelationScorer, Placement, ScoreKind, ScoreMap};
pub use search::{
    golden_section, Axis, Match, MatchConfig, Matcher, NoopObserver, Phase, Probe, RefineConfig,
    RotationSearch, ScaleSearch, SearchMode, Trial, TrialLog, TrialObserver,
};
pub use template::{rotate_bilinear, rotated_origin, scale_nearest, scaled_shape};
pub use util::{FftMatchError, FftMatchResult};
