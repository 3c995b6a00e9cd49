#![cfg(feature = "rayon")]

use fftmatch::{
    rotate_bilinear, MatchConfig, Matcher, PixelGrid, ScoreKind, SearchMode, TrialLog,
};

fn make_template(height: usize, width: usize) -> PixelGrid {
    PixelGrid::from_fn(height, width, |r, c| (((c * 11) ^ (r * 3) ^ (r * c)) & 0xFF) as u8)
        .unwrap()
}

fn run(cfg: MatchConfig, source: &PixelGrid, template: &PixelGrid) -> TrialLog {
    let matcher = Matcher::new(cfg).unwrap();
    let mut log = TrialLog::new();
    matcher
        .match_image_observed(source, template, &mut log)
        .unwrap()
        .unwrap();
    log
}

#[test]
fn parallel_matches_sequential_rotation_search() {
    let template = make_template(14, 18);
    let rotated = rotate_bilinear(&template, 0.6).unwrap();
    let source = PixelGrid::from_fn(60, 70, |r, c| {
        let (tr, tc) = (r.wrapping_sub(15), c.wrapping_sub(22));
        if tr < rotated.height() && tc < rotated.width() && rotated.mask().is_valid(tr, tc) {
            rotated.grid().get(tr, tc).unwrap()
        } else {
            ((r * 7 + c * 5) % 31) as u8
        }
    })
    .unwrap();

    for score in [ScoreKind::SumSquaredDifference, ScoreKind::NormalizedCorrelation] {
        let base = MatchConfig {
            score,
            mode: SearchMode::Rotation,
            ..MatchConfig::default()
        };
        let seq = run(MatchConfig { parallel: false, ..base }, &source, &template);
        let par = run(MatchConfig { parallel: true, ..base }, &source, &template);
        assert_eq!(seq.trials(), par.trials(), "{score:?}");
    }
}

#[test]
fn parallel_matches_sequential_scale_search() {
    let template = make_template(10, 12);
    let source = PixelGrid::from_fn(50, 50, |r, c| {
        if (12..32).contains(&r) && (9..33).contains(&c) {
            template.get((r - 12) / 2, (c - 9) / 2).unwrap()
        } else {
            0
        }
    })
    .unwrap();

    let base = MatchConfig {
        mode: SearchMode::Scale,
        ..MatchConfig::default()
    };
    let seq = run(MatchConfig { parallel: false, ..base }, &source, &template);
    let par = run(MatchConfig { parallel: true, ..base }, &source, &template);
    assert_eq!(seq.trials(), par.trials());
}
