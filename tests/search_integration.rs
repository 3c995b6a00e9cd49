use fftmatch::{
    golden_section, rotate_bilinear, rotated_origin, scale_nearest, Axis, FftMatchResult,
    MaskedTemplate, MatchConfig, Matcher, Phase, PixelGrid, Probe, RefineConfig, RotationSearch,
    ScaleSearch, ScoreKind, SearchMode, TrialLog,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_grid(rng: &mut StdRng, height: usize, width: usize) -> PixelGrid {
    PixelGrid::from_fn(height, width, |_, _| rng.random::<u8>()).unwrap()
}

/// Copies the valid cells of `template` into `source` at `(row, col)`.
fn paste(source: &PixelGrid, template: &MaskedTemplate, row: usize, col: usize) -> PixelGrid {
    PixelGrid::from_fn(source.height(), source.width(), |r, c| {
        let inside = r >= row
            && c >= col
            && r - row < template.height()
            && c - col < template.width();
        if inside && template.mask().is_valid(r - row, c - col) {
            template.grid().get(r - row, c - col).unwrap()
        } else {
            source.get(r, c).unwrap()
        }
    })
    .unwrap()
}

fn cone(size: usize) -> PixelGrid {
    let centre = (size as f64 - 1.0) * 0.5;
    PixelGrid::from_fn(size, size, |r, c| {
        let d = ((r as f64 - centre).powi(2) + (c as f64 - centre).powi(2)).sqrt();
        (250.0 - 30.0 * d).max(0.0) as u8
    })
    .unwrap()
}

#[test]
fn scaling_source_and_template_scales_the_position() {
    let mut rng = StdRng::seed_from_u64(21);
    let source = random_grid(&mut rng, 30, 26);
    let (row, col) = (8, 12);
    let template = source.crop(row, col, 7, 5).unwrap();
    let matcher = Matcher::new(MatchConfig::default()).unwrap();

    for k in [2.0, 3.0, 1.5] {
        let big_source = scale_nearest(&source, k).unwrap();
        let big_template = scale_nearest(&template, k).unwrap();
        let found = matcher
            .match_position(big_source.grid(), &big_template)
            .unwrap()
            .unwrap();
        let expected = ((row as f64 * k) as usize, (col as f64 * k) as usize);
        assert_eq!((found.row, found.col), expected, "k = {k}");
        assert_eq!(found.score, 0.0);
    }
}

#[test]
fn golden_section_finds_minimum_of_unimodal_function() {
    let mut calls = 0usize;
    let best = golden_section(-1.0, 2.0, 20, ScoreKind::SumSquaredDifference, |x| {
        calls += 1;
        FftMatchResult::Ok(Probe::new(x, (x - 0.7).powi(2) + 3.0, ()))
    })
    .unwrap();
    assert_eq!(calls, 22);
    assert!((best.param - 0.7).abs() < 1e-3, "param {}", best.param);
}

#[test]
fn scale_search_recovers_enlarged_template() {
    let template = cone(16);
    let planted = scale_nearest(&template, 2.0).unwrap();
    let source = paste(&PixelGrid::filled(96, 96, 0).unwrap(), &planted, 30, 40);

    let cfg = MatchConfig {
        mode: SearchMode::Scale,
        ..MatchConfig::default()
    };
    let matcher = Matcher::new(cfg).unwrap();
    let mut log = TrialLog::new();
    let found = matcher
        .match_image_observed(&source, &template, &mut log)
        .unwrap()
        .unwrap();

    assert!((found.scale - 2.0).abs() < 0.2, "scale {}", found.scale);
    assert!(found.row.abs_diff(30) <= 2, "row {}", found.row);
    assert!(found.col.abs_diff(40) <= 2, "col {}", found.col);
    assert_eq!(found.angle_rad, 0.0);

    let refine = cfg.refine;
    assert_eq!(log.count(Axis::Scale, Phase::Coarse), cfg.scale.steps);
    let refined = log.count(Axis::Scale, Phase::Refine);
    assert!(refined <= refine.max_search * (refine.iterations + 2));
    assert_eq!(refined % (refine.iterations + 2), 0);
    assert_eq!(log.trials().len(), cfg.scale.steps + refined);
}

#[test]
fn scale_search_with_no_fitting_factor_is_not_found() {
    let source = PixelGrid::filled(20, 20, 5).unwrap();
    let template = PixelGrid::filled(10, 10, 5).unwrap();
    let cfg = MatchConfig {
        mode: SearchMode::Scale,
        scale: ScaleSearch {
            min_scale: 2.5,
            max_scale: 4.0,
            steps: 5,
        },
        ..MatchConfig::default()
    };
    let matcher = Matcher::new(cfg).unwrap();
    let mut log = TrialLog::new();
    assert!(matcher
        .match_image_observed(&source, &template, &mut log)
        .unwrap()
        .is_none());
    assert!(log.trials().is_empty());
}

#[test]
fn rotation_search_recovers_angle_and_position() {
    let template = PixelGrid::from_fn(16, 16, |r, c| (10 + 12 * r + 4 * c) as u8).unwrap();
    let angle = 1.0;
    let planted = rotate_bilinear(&template, angle).unwrap();
    let source = paste(&PixelGrid::filled(64, 64, 0).unwrap(), &planted, 20, 24);

    let cfg = MatchConfig {
        mode: SearchMode::Rotation,
        ..MatchConfig::default()
    };
    let matcher = Matcher::new(cfg).unwrap();
    let mut log = TrialLog::new();
    let found = matcher
        .match_image_observed(&source, &template, &mut log)
        .unwrap()
        .unwrap();

    let (off_r, off_c) = rotated_origin(planted.mask(), angle);
    assert!((found.angle_rad - angle).abs() < 0.05, "angle {}", found.angle_rad);
    assert!(found.row.abs_diff(20 + off_r) <= 2, "row {}", found.row);
    assert!(found.col.abs_diff(24 + off_c) <= 2, "col {}", found.col);
    assert_eq!(found.scale, 1.0);

    let rotation = cfg.rotation;
    let refine = cfg.refine;
    assert_eq!(log.count(Axis::Rotation, Phase::Prescan), rotation.prescan_steps);
    assert_eq!(log.count(Axis::Rotation, Phase::Coarse), rotation.steps);
    let refined = log.count(Axis::Rotation, Phase::Refine);
    assert!(refined <= refine.max_search * (refine.iterations + 2));
    assert!(
        log.trials().len()
            <= rotation.prescan_steps
                + rotation.steps
                + refine.max_search * (refine.iterations + 2)
    );
    assert!(log
        .trials()
        .iter()
        .all(|trial| (0.0..std::f64::consts::TAU).contains(&trial.param)));
}

#[test]
fn rotation_search_without_cropping_skips_prescan() {
    let template = PixelGrid::from_fn(12, 12, |r, c| (20 + 15 * r + 3 * c) as u8).unwrap();
    let planted = rotate_bilinear(&template, 2.0).unwrap();
    let source = paste(&PixelGrid::filled(48, 48, 0).unwrap(), &planted, 10, 14);

    let cfg = MatchConfig {
        mode: SearchMode::Rotation,
        rotation: RotationSearch {
            crop_source: false,
            ..RotationSearch::default()
        },
        ..MatchConfig::default()
    };
    let matcher = Matcher::new(cfg).unwrap();
    let mut log = TrialLog::new();
    let found = matcher
        .match_rotation_observed(&source, &template, &mut log)
        .unwrap()
        .unwrap();

    let (off_r, off_c) = rotated_origin(planted.mask(), 2.0);
    assert_eq!(log.count(Axis::Rotation, Phase::Prescan), 0);
    assert!((found.angle_rad - 2.0).abs() < 0.05, "angle {}", found.angle_rad);
    assert!(found.row.abs_diff(10 + off_r) <= 2, "row {}", found.row);
    assert!(found.col.abs_diff(14 + off_c) <= 2, "col {}", found.col);
}

#[test]
fn rotation_search_reports_the_rotated_corner() {
    let template = PixelGrid::from_fn(16, 16, |r, c| (10 + 12 * r + 4 * c) as u8).unwrap();
    let angle = std::f64::consts::FRAC_PI_4;
    let planted = rotate_bilinear(&template, angle).unwrap();
    let source = paste(&PixelGrid::filled(64, 64, 0).unwrap(), &planted, 20, 24);

    // At an eighth turn the corner sits on the top edge, mid-way across.
    let (off_r, off_c) = rotated_origin(planted.mask(), angle);
    assert_eq!(off_r, 0);
    assert!((7..=12).contains(&off_c), "offset {off_c}");

    let cfg = MatchConfig {
        mode: SearchMode::Rotation,
        ..MatchConfig::default()
    };
    let found = Matcher::new(cfg)
        .unwrap()
        .match_image(&source, &template)
        .unwrap()
        .unwrap();

    assert!((found.angle_rad - angle).abs() < 0.05, "angle {}", found.angle_rad);
    assert!(found.row.abs_diff(20) <= 1, "row {}", found.row);
    assert!(found.col.abs_diff(24 + off_c) <= 1, "col {}", found.col);
}

#[test]
fn nested_scale_rotation_search_reports_every_trial() {
    let mut rng = StdRng::seed_from_u64(5);
    let template = random_grid(&mut rng, 12, 12);
    let background = random_grid(&mut rng, 48, 48);
    let source = paste(&background, &MaskedTemplate::unmasked(template.clone()), 10, 17);

    let cfg = MatchConfig {
        mode: SearchMode::ScaleRotation,
        scale: ScaleSearch {
            min_scale: 1.0,
            max_scale: 1.5,
            steps: 3,
        },
        rotation: RotationSearch {
            prescan_steps: 4,
            steps: 4,
            crop_margin: 4,
            crop_source: true,
        },
        refine: RefineConfig {
            max_search: 1,
            iterations: 3,
        },
        ..MatchConfig::default()
    };
    let matcher = Matcher::new(cfg).unwrap();
    let mut log = TrialLog::new();
    let found = matcher
        .match_image_observed(&source, &template, &mut log)
        .unwrap()
        .unwrap();

    assert_eq!((found.row, found.col), (10, 17));
    assert_eq!((found.scale, found.angle_rad, found.score), (1.0, 0.0, 0.0));

    let scale_trials =
        log.count(Axis::Scale, Phase::Coarse) + log.count(Axis::Scale, Phase::Refine);
    assert_eq!(log.count(Axis::Scale, Phase::Coarse), 3);
    assert!(scale_trials <= 3 + 5);
    assert_eq!(log.count(Axis::Rotation, Phase::Prescan), 4 * scale_trials);
    assert_eq!(log.count(Axis::Rotation, Phase::Coarse), 4 * scale_trials);
    assert!(log.count(Axis::Rotation, Phase::Refine) <= 5 * scale_trials);

    // Each scale trial follows the rotation trials it summarizes.
    let last = log.trials().last().unwrap();
    assert_eq!(last.axis, Axis::Scale);
    assert_eq!(log.trials()[0].axis, Axis::Rotation);
}

#[test]
fn closure_observer_counts_trials() {
    let mut rng = StdRng::seed_from_u64(8);
    let source = random_grid(&mut rng, 32, 32);
    let template = source.crop(4, 9, 6, 6).unwrap();
    let cfg = MatchConfig {
        mode: SearchMode::Rotation,
        ..MatchConfig::default()
    };
    let matcher = Matcher::new(cfg).unwrap();

    let mut trials = 0usize;
    let mut count = |_: &fftmatch::Trial| trials += 1;
    let found = matcher
        .match_image_observed(&source, &template, &mut count)
        .unwrap()
        .unwrap();
    assert_eq!((found.row, found.col, found.angle_rad), (4, 9, 0.0));
    assert!(trials >= 8 + 16);
    assert!(trials <= 8 + 16 + 2 * 12);
}
