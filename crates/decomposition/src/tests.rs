use super::*;

/// Deterministic pseudo-random noise in [-0.5, 0.5).
fn noise(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5
        })
        .collect()
}

fn assert_reconstructs(values: &[f64], d: &Decomposition) {
    let rebuilt = d.reconstruct();
    assert_eq!(rebuilt.len(), values.len());
    for (a, b) in values.iter().zip(&rebuilt) {
        assert!((a - b).abs() < 1e-6, "expected {a}, got {b}");
    }
}

#[test]
fn test_reconstruction_holds() {
    let n = 24 * 21;
    let values: Vec<f64> = noise(n, 7)
        .iter()
        .enumerate()
        .map(|(t, e)| {
            5.0 + 0.01 * t as f64
                + 3.0 * (2.0 * std::f64::consts::PI * t as f64 / 24.0).sin()
                + if (t / 24) % 7 >= 5 { 2.0 } else { 0.0 }
                + e
        })
        .collect();
    for periodicities in [vec![24, 168], vec![168, 24], vec![7], vec![], vec![12, 1000]] {
        let d = decompose(&values, &periodicities).unwrap();
        assert_reconstructs(&values, &d);
    }
}

#[test]
fn test_all_zero_history() {
    let values = vec![0.0; 24 * 14];
    let d = decompose(&values, &[24, 168]).unwrap();
    assert!(d.is_complete());
    assert!(d.level.iter().all(|v| v.abs() < 1e-12));
    for s in &d.seasonal {
        assert!(s.profile.iter().all(|v| v.abs() < 1e-12));
    }
    assert!(d.residual_std() < 1e-12);
}

#[test]
fn test_periodic_series_recovered() {
    // 10 at phase 0 of every day, nothing else.
    let values: Vec<f64> = (0..24 * 28).map(|t| if t % 24 == 0 { 10.0 } else { 0.0 }).collect();
    let d = decompose(&values, &[24]).unwrap();
    let s = d.component(24).unwrap();
    assert!((s.profile[0] - (10.0 - 10.0 / 24.0)).abs() < 1e-9);
    assert!((s.profile[5] + 10.0 / 24.0).abs() < 1e-9);
    assert!(d.level.iter().all(|l| (l - 10.0 / 24.0).abs() < 1e-9));
    assert!(d.residual.iter().all(|r| r.abs() < 1e-9));
    // Profiles extend past the end of the series.
    assert!((d.seasonal_at(24 * 28) - s.profile[0]).abs() < 1e-12);
}

#[test]
fn test_profiles_sum_to_zero() {
    let values: Vec<f64> = noise(84 * 3, 3).iter().enumerate().map(|(t, e)| (t % 12) as f64 + e).collect();
    let d = decompose(&values, &[12, 84]).unwrap();
    for s in &d.seasonal {
        assert!(s.profile.iter().sum::<f64>().abs() < 1e-9);
        assert_eq!(s.profile.len(), s.periodicity);
    }
}

#[test]
fn test_short_series_skips_periodicity() {
    let values: Vec<f64> = (0..100).map(|t| (t % 24) as f64).collect();
    let d = decompose(&values, &[168, 24]).unwrap();
    assert!(!d.is_complete());
    assert_eq!(d.seasonal[0].periodicity, 168);
    assert!(!d.seasonal[0].estimated);
    assert!(d.seasonal[0].values.iter().all(|&v| v == 0.0));
    assert!(d.seasonal[1].estimated);
    assert_reconstructs(&values, &d);
}

#[test]
fn test_nothing_estimated_uses_mean_level() {
    let values = vec![1.0, 2.0, 3.0, 6.0];
    let d = decompose(&values, &[24]).unwrap();
    assert!(d.level.iter().all(|&l| (l - 3.0).abs() < 1e-12));
    assert_reconstructs(&values, &d);
}

#[test]
fn test_output_follows_request_order() {
    let values = noise(24 * 7 * 3, 11);
    let d = decompose(&values, &[168, 24]).unwrap();
    let order: Vec<_> = d.seasonal.iter().map(|s| s.periodicity).collect();
    assert_eq!(order, vec![168, 24]);
}

#[test]
fn test_invalid_periodicities() {
    let values = vec![1.0; 50];
    assert!(matches!(decompose(&values, &[1]), Err(GridcastError::Configuration(_))));
    assert!(matches!(decompose(&values, &[0]), Err(GridcastError::Configuration(_))));
    assert!(matches!(decompose(&values, &[7, 7]), Err(GridcastError::Configuration(_))));
}

#[test]
fn test_empty_series() {
    let d = decompose(&[], &[24]).unwrap();
    assert!(d.is_empty());
    assert!(d.reconstruct().is_empty());
}

#[test]
fn test_odd_periodicity() {
    let values: Vec<f64> = (0..70).map(|t| [3.0, 1.0, 0.0, 0.0, 0.0, 5.0, 5.0][t % 7]).collect();
    let d = decompose(&values, &[7]).unwrap();
    let s = d.component(7).unwrap();
    let mean = 2.0;
    assert!((s.profile[0] - (3.0 - mean)).abs() < 1e-9);
    assert!((s.profile[6] - (5.0 - mean)).abs() < 1e-9);
    assert!(d.level.iter().all(|l| (l - mean).abs() < 1e-9));
}

#[test]
fn test_last_level_averages_full_window() {
    // Flat demand with one spike in the very last bucket.
    let mut values = vec![5.0; 24 * 28];
    *values.last_mut().unwrap() = 50.0;
    let d = decompose(&values, &[24, 168]).unwrap();
    let last = d.last_level().unwrap();
    assert!(last > 5.0 && last < 5.5, "last level {last}");
    // The spike stays in the residual instead of moving the level.
    assert!(*d.residual.last().unwrap() > 40.0);
    assert_reconstructs(&values, &d);
}

#[test]
fn test_level_near_ends_uses_full_window() {
    let values: Vec<f64> = (0..30).map(|t| if t < 20 { 2.0 } else { 8.0 }).collect();
    let d = decompose(&values, &[7]).unwrap();
    // Seven-bucket windows everywhere: the first level mixes only the flat
    // start, the last one only the tail.
    let s = d.component(7).unwrap();
    let adjusted_head: f64 = (0..7).map(|t| values[t] - s.values[t]).sum::<f64>() / 7.0;
    let adjusted_tail: f64 = (23..30).map(|t| values[t] - s.values[t]).sum::<f64>() / 7.0;
    assert!((d.level[0] - adjusted_head).abs() < 1e-9);
    assert!((d.last_level().unwrap() - adjusted_tail).abs() < 1e-9);
}
