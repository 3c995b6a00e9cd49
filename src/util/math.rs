//! Mathematical helpers for parameter search.

use std::f64::consts::TAU;

/// Golden-section ratio `(sqrt(5) - 1) / 2`.
pub(crate) const INV_PHI: f64 = 0.618_033_988_749_894_9;

/// Wraps an angle in radians to the range [0, 2π).
pub(crate) fn wrap_rad(angle_rad: f64) -> f64 {
    let wrapped = angle_rad.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs.
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Returns `len` geometrically spaced samples from `min` to `max` inclusive.
pub(crate) fn geometric_samples(min: f64, max: f64, len: usize) -> Vec<f64> {
    if len == 1 {
        return vec![min];
    }
    let ratio = max / min;
    (0..len)
        .map(|idx| min * ratio.powf(idx as f64 / (len - 1) as f64))
        .collect()
}

/// Returns `len` uniformly spaced angles over [0, 2π).
pub(crate) fn circular_samples(len: usize) -> Vec<f64> {
    (0..len).map(|idx| TAU * idx as f64 / len as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::{circular_samples, geometric_samples, wrap_rad, INV_PHI};
    use std::f64::consts::{PI, TAU};

    #[test]
    fn wrap_rad_maps_to_expected_range() {
        assert!((wrap_rad(-PI / 2.0) - 1.5 * PI).abs() < 1e-12);
        assert!((wrap_rad(TAU + 0.25) - 0.25).abs() < 1e-12);
        assert_eq!(wrap_rad(0.0), 0.0);
        assert!(wrap_rad(-1e-300) < TAU);
    }

    #[test]
    fn inv_phi_matches_definition() {
        assert!((INV_PHI - (5.0f64.sqrt() - 1.0) / 2.0).abs() < 1e-15);
    }

    #[test]
    fn geometric_samples_hit_endpoints() {
        let samples = geometric_samples(0.25, 4.0, 5);
        assert_eq!(samples.len(), 5);
        assert!((samples[0] - 0.25).abs() < 1e-12);
        assert!((samples[2] - 1.0).abs() < 1e-12);
        assert!((samples[4] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn circular_samples_exclude_full_turn() {
        let samples = circular_samples(4);
        assert_eq!(samples.len(), 4);
        assert!((samples[3] - 1.5 * PI).abs() < 1e-12);
    }
}
