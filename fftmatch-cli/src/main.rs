use clap::Parser;
use fftmatch::io::load_gray_image;
use fftmatch::{
    Match, MatchConfig, Matcher, PixelGrid, RefineConfig, RotationSearch, ScaleSearch, ScoreKind,
    SearchMode, Trial,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "fftmatch CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ScoreConfig {
    Ssd,
    Ncc,
}

impl From<ScoreConfig> for ScoreKind {
    fn from(value: ScoreConfig) -> Self {
        match value {
            ScoreConfig::Ssd => ScoreKind::SumSquaredDifference,
            ScoreConfig::Ncc => ScoreKind::NormalizedCorrelation,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ModeConfig {
    Position,
    Scale,
    Rotation,
    ScaleRotation,
}

impl From<ModeConfig> for SearchMode {
    fn from(value: ModeConfig) -> Self {
        match value {
            ModeConfig::Position => SearchMode::Position,
            ModeConfig::Scale => SearchMode::Scale,
            ModeConfig::Rotation => SearchMode::Rotation,
            ModeConfig::ScaleRotation => SearchMode::ScaleRotation,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ScaleJson {
    min_scale: f64,
    max_scale: f64,
    steps: usize,
}

impl Default for ScaleJson {
    fn default() -> Self {
        let cfg = ScaleSearch::default();
        Self {
            min_scale: cfg.min_scale,
            max_scale: cfg.max_scale,
            steps: cfg.steps,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RotationJson {
    prescan_steps: usize,
    steps: usize,
    crop_margin: usize,
    crop_source: bool,
}

impl Default for RotationJson {
    fn default() -> Self {
        let cfg = RotationSearch::default();
        Self {
            prescan_steps: cfg.prescan_steps,
            steps: cfg.steps,
            crop_margin: cfg.crop_margin,
            crop_source: cfg.crop_source,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RefineJson {
    max_search: usize,
    iterations: usize,
}

impl Default for RefineJson {
    fn default() -> Self {
        let cfg = RefineConfig::default();
        Self {
            max_search: cfg.max_search,
            iterations: cfg.iterations,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct MatchConfigJson {
    score: ScoreConfig,
    mode: ModeConfig,
    parallel: bool,
    scale: ScaleJson,
    rotation: RotationJson,
    refine: RefineJson,
}

impl Default for MatchConfigJson {
    fn default() -> Self {
        Self {
            score: ScoreConfig::Ssd,
            mode: ModeConfig::Position,
            parallel: false,
            scale: ScaleJson::default(),
            rotation: RotationJson::default(),
            refine: RefineJson::default(),
        }
    }
}

impl From<&MatchConfigJson> for MatchConfig {
    fn from(value: &MatchConfigJson) -> Self {
        MatchConfig {
            score: value.score.into(),
            mode: value.mode.into(),
            parallel: value.parallel,
            scale: ScaleSearch {
                min_scale: value.scale.min_scale,
                max_scale: value.scale.max_scale,
                steps: value.scale.steps,
            },
            rotation: RotationSearch {
                prescan_steps: value.rotation.prescan_steps,
                steps: value.rotation.steps,
                crop_margin: value.rotation.crop_margin,
                crop_source: value.rotation.crop_source,
            },
            refine: RefineConfig {
                max_search: value.refine.max_search,
                iterations: value.refine.iterations,
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    source_path: String,
    template_path: String,
    output_path: Option<String>,
    /// Scores worse than this are reported as not accepted.
    accept_score: Option<f64>,
    #[serde(rename = "match")]
    match_cfg: MatchConfigJson,
}

#[derive(Debug, Serialize)]
struct MatchRecord {
    row: usize,
    col: usize,
    score: f64,
    scale: f64,
    angle_rad: f64,
    angle_deg: f64,
}

impl From<Match> for MatchRecord {
    fn from(value: Match) -> Self {
        Self {
            row: value.row,
            col: value.col,
            score: value.score,
            scale: value.scale,
            angle_rad: value.angle_rad,
            angle_deg: value.angle_rad.to_degrees(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    found: bool,
    accepted: bool,
    best: Option<MatchRecord>,
    trials: usize,
}

/// Parses the plain-text grid format: a `height width` header followed by
/// `height * width` whitespace-separated intensities in row-major order.
fn parse_text_grid(text: &str) -> Result<PixelGrid, Box<dyn std::error::Error>> {
    let mut tokens = text.split_whitespace();
    let mut header = |name: &str| -> Result<usize, Box<dyn std::error::Error>> {
        let token = tokens
            .next()
            .ok_or_else(|| format!("missing {name} in grid header"))?;
        Ok(token
            .parse::<usize>()
            .map_err(|err| format!("invalid {name} {token:?}: {err}"))?)
    };
    let height = header("height")?;
    let width = header("width")?;

    let data = tokens
        .map(|token| {
            token
                .parse::<u8>()
                .map_err(|err| format!("invalid intensity {token:?}: {err}"))
        })
        .collect::<Result<Vec<u8>, String>>()?;
    Ok(PixelGrid::new(data, height, width)?)
}

/// Loads a grid from `.txt`/`.grid` text files or any image format `image`
/// decodes.
fn load_grid(path: &Path) -> Result<PixelGrid, Box<dyn std::error::Error>> {
    let is_text = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt") || ext.eq_ignore_ascii_case("grid"));
    if is_text {
        let text = fs::read_to_string(path)?;
        parse_text_grid(&text).map_err(|err| format!("{}: {err}", path.display()).into())
    } else {
        Ok(load_gray_image(path)?)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("fftmatch=debug".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.source_path.is_empty() || config.template_path.is_empty() {
        return Err("source_path and template_path must be set in the config".into());
    }

    let source = load_grid(Path::new(&config.source_path))?;
    let template = load_grid(Path::new(&config.template_path))?;

    let match_cfg = MatchConfig::from(&config.match_cfg);
    let matcher = Matcher::new(match_cfg)?;
    let mut trials = 0usize;
    let mut count = |_: &Trial| trials += 1;
    let best = matcher.match_image_observed(&source, &template, &mut count)?;

    let accepted = match (best, config.accept_score) {
        (Some(found), Some(threshold)) => match_cfg.score.passes(found.score, threshold),
        (Some(_), None) => true,
        (None, _) => false,
    };
    let output = Output {
        found: best.is_some(),
        accepted,
        best: best.map(MatchRecord::from),
        trials,
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
